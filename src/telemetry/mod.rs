//! Heap telemetry emitted by the finalizer chain.
//!
//! A snapshot is built at the moment a finalizer runs and handed straight to a
//! sink. Nothing here caches or merges snapshots.

pub mod sink;
pub mod snapshot;

pub use sink::{JsonSink, MemorySink, SinkError, TelemetrySink, TracingSink};
pub use snapshot::StatsSnapshot;
