//! Collection-driven finalizer chain.
//!
//! Three pieces, each runnable on its own:
//! - [`Heap`]: modeled collector. Finds unreachable tracked objects during a
//!   forced pass and queues their finalizers.
//! - [`FinalizerQueue`]: runs the queued finalizers, off the collector's stack.
//! - [`FinalizerChain`]: keeps exactly one tracked object alive in the heap,
//!   reporting telemetry every time the previous one is finalized.

pub mod chain;
pub mod heap;
pub mod queue;

pub use chain::{run_control_loop, ChainConfig, ChainHandle, ChainState, FinalizerChain, TrackedObject};
pub use heap::{CollectionReport, Collector, Finalizer, Heap, ObjectId};
pub use queue::FinalizerQueue;
