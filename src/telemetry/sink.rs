use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::snapshot::StatsSnapshot;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("telemetry output failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry sink poisoned")]
    Poisoned,
}

/// Receives each snapshot synchronously, inside the finalizer that produced it.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, snapshot: &StatsSnapshot) -> Result<(), SinkError>;
}

/// Writes every snapshot as a pretty JSON document with 4-space indentation.
pub struct JsonSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.out.into_inner().map_err(|_| SinkError::Poisoned)
    }
}

impl JsonSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TelemetrySink for JsonSink<W> {
    fn emit(&self, snapshot: &StatsSnapshot) -> Result<(), SinkError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        snapshot.serialize(&mut ser)?;
        buf.push(b'\n');

        let mut out = self.out.lock().map_err(|_| SinkError::Poisoned)?;
        out.write_all(&buf)?;
        out.flush()?;
        Ok(())
    }
}

/// Emits each snapshot as a structured `tracing` event.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn emit(&self, s: &StatsSnapshot) -> Result<(), SinkError> {
        info!(
            num_gc = s.num_gc,
            live_objects = s.live_objects,
            pending_finalizers = s.pending_finalizers,
            heap_alloc_bytes = s.heap_alloc_bytes,
            total_alloc_bytes = s.total_alloc_bytes,
            mallocs = s.mallocs,
            frees = s.frees,
            last_pause_ns = s.last_pause_ns,
            pause_total_ns = s.pause_total_ns,
            last_gc_unix_ns = s.last_gc_unix_ns,
            "heap stats"
        );
        Ok(())
    }
}

/// Keeps every snapshot in memory. Used by tests and by callers that want to
/// inspect telemetry after the fact.
#[derive(Debug, Default)]
pub struct MemorySink {
    snapshots: Mutex<Vec<StatsSnapshot>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<StatsSnapshot> {
        self.snapshots
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for MemorySink {
    fn emit(&self, snapshot: &StatsSnapshot) -> Result<(), SinkError> {
        self.snapshots
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(*snapshot);
        Ok(())
    }
}
