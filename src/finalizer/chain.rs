use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::heap::{Collector, Heap, ObjectId};
use super::queue::FinalizerQueue;
use crate::telemetry::TelemetrySink;

/// Default pause between forced passes.
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Nothing registered yet.
    Idle,
    /// One object registered and waiting for a pass to find it unreachable.
    Tracking,
    /// A finalizer is running.
    Finalizing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub interval_ms: u64,
    /// Value stored in every tracked object. Never read.
    pub payload: i64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            payload: 0,
        }
    }
}

impl ChainConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// The object the chain keeps recreating.
#[derive(Debug)]
pub struct TrackedObject {
    pub payload: i64,
}

struct ChainShared {
    sink: Arc<dyn TelemetrySink>,
    state: watch::Sender<ChainState>,
    emitted: AtomicU64,
    payload: i64,
}

/// Self-sustaining chain of exactly one tracked object at a time.
///
/// Each finalizer reports a [`StatsSnapshot`](crate::telemetry::StatsSnapshot)
/// to the sink and registers the next object before returning.
pub struct FinalizerChain {
    shared: Arc<ChainShared>,
    state_rx: watch::Receiver<ChainState>,
}

impl FinalizerChain {
    pub fn new(sink: Arc<dyn TelemetrySink>, payload: i64) -> Self {
        let (state, state_rx) = watch::channel(ChainState::Idle);
        Self {
            shared: Arc::new(ChainShared {
                sink,
                state,
                emitted: AtomicU64::new(0),
                payload,
            }),
            state_rx,
        }
    }

    /// Producer step: register a fresh object and let go of it.
    ///
    /// Only the first call starts the chain. Once it has left `Idle` the chain
    /// sustains itself and this returns `None`.
    pub fn produce(&self, heap: &Heap) -> Option<ObjectId> {
        start(heap, &self.shared)
    }

    pub fn subscribe(&self) -> watch::Receiver<ChainState> {
        self.state_rx.clone()
    }

    pub fn state(&self) -> ChainState {
        *self.state_rx.borrow()
    }

    pub fn snapshots_emitted(&self) -> u64 {
        self.shared.emitted.load(Ordering::SeqCst)
    }

    /// Start the chain on a fresh heap.
    pub fn spawn(self, config: &ChainConfig) -> ChainHandle {
        let (heap, queue) = Heap::new();
        self.spawn_on(Arc::new(heap), queue, config.interval())
    }

    /// Start the control loop, the finalizer consumer and the first producer
    /// step as three separate tasks. Must be called inside a tokio runtime.
    pub fn spawn_on(self, heap: Arc<Heap>, queue: FinalizerQueue, interval: Duration) -> ChainHandle {
        let cancel = CancellationToken::new();
        info!(interval_ms = interval.as_millis() as u64, "finalizer chain starting");

        let consumer = tokio::spawn(queue.run(Arc::clone(&heap), cancel.clone()));
        let control = tokio::spawn(run_control_loop(Arc::clone(&heap), interval, cancel.clone()));

        // May race the first pass. That pass then just reclaims nothing.
        let producer = {
            let heap = Arc::clone(&heap);
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                if start(&heap, &shared).is_none() {
                    debug!("chain already running, first producer step skipped");
                }
            })
        };

        ChainHandle {
            heap,
            chain: self,
            cancel,
            control,
            workers: vec![consumer, producer],
        }
    }
}

// Idle -> Tracking happens at most once per chain.
fn start(heap: &Heap, shared: &Arc<ChainShared>) -> Option<ObjectId> {
    let claimed = shared.state.send_if_modified(|state| {
        if *state == ChainState::Idle {
            *state = ChainState::Tracking;
            true
        } else {
            false
        }
    });
    claimed.then(|| produce(heap, shared))
}

fn produce(heap: &Heap, shared: &Arc<ChainShared>) -> ObjectId {
    let object = Arc::new(TrackedObject {
        payload: shared.payload,
    });
    let next = Arc::clone(shared);
    let id = heap.register(&object, move |heap, id| notify(heap, id, &next));
    shared.state.send_replace(ChainState::Tracking);
    // Sole strong handle. The object is unreachable from here on.
    drop(object);
    id
}

fn notify(heap: &Heap, id: ObjectId, shared: &Arc<ChainShared>) {
    shared.state.send_replace(ChainState::Finalizing);

    let snapshot = heap.stats();
    match shared.sink.emit(&snapshot) {
        Ok(()) => {
            shared.emitted.fetch_add(1, Ordering::SeqCst);
        }
        Err(e) => warn!(object = id, "telemetry sink failed: {}", e),
    }

    let next = produce(heap, shared);
    debug!(finalized = id, next, "chain advanced");
}

/// Force a pass, wait for the finalizers it queued, sleep, repeat.
///
/// Returns the number of passes forced once `cancel` fires.
pub async fn run_control_loop<C>(collector: Arc<C>, interval: Duration, cancel: CancellationToken) -> u64
where
    C: Collector + ?Sized,
{
    let mut passes = 0;
    while !cancel.is_cancelled() {
        let report = collector.force_collection();
        passes += 1;
        info!(cycle = report.cycle, reclaimed = report.reclaimed, "forced collection");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = report.finalized() => {}
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    info!(passes, "control loop stopped");
    passes
}

/// Running chain. Dropping it leaves the tasks running; call [`stop`](Self::stop).
pub struct ChainHandle {
    heap: Arc<Heap>,
    chain: FinalizerChain,
    cancel: CancellationToken,
    control: JoinHandle<u64>,
    workers: Vec<JoinHandle<()>>,
}

impl ChainHandle {
    pub fn state(&self) -> ChainState {
        self.chain.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChainState> {
        self.chain.subscribe()
    }

    pub fn snapshots_emitted(&self) -> u64 {
        self.chain.snapshots_emitted()
    }

    pub fn heap(&self) -> &Arc<Heap> {
        &self.heap
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel every task and wait for them. Returns the number of passes forced.
    pub async fn stop(self) -> u64 {
        self.cancel.cancel();
        let passes = self.control.await.unwrap_or_default();
        for worker in self.workers {
            let _ = worker.await;
        }
        info!(passes, emitted = self.chain.snapshots_emitted(), "finalizer chain stopped");
        passes
    }
}
