pub mod config;
pub mod finalizer;
pub mod keymap;
pub mod telemetry;

pub use finalizer::{FinalizerChain, Heap};
pub use keymap::{CompositeKey, StructuralKeyMap};
