use serde::{Deserialize, Serialize};

/// Point-in-time heap counters, read fresh on every finalizer invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Completed collection passes.
    pub num_gc: u64,
    /// Registered objects that still have a strong handle somewhere.
    pub live_objects: u64,
    /// Registered objects not yet finalized, reachable or not.
    pub pending_finalizers: u64,
    pub heap_alloc_bytes: u64,
    pub total_alloc_bytes: u64,
    pub mallocs: u64,
    pub frees: u64,
    pub last_pause_ns: u64,
    pub pause_total_ns: u64,
    /// Wall-clock end of the last pass, nanoseconds since the Unix epoch. Zero before the first pass.
    pub last_gc_unix_ns: u64,
}
