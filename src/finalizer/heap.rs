use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::telemetry::StatsSnapshot;

pub type ObjectId = u64;

/// Lifecycle-end callback. Runs once, on the finalizer queue's task, after a
/// collection pass found the object unreachable.
pub type Finalizer = Box<dyn FnOnce(&Heap, ObjectId) + Send>;

struct Registration {
    handle: Weak<dyn Any + Send + Sync>,
    bytes: u64,
    finalizer: Finalizer,
}

impl Registration {
    fn reachable(&self) -> bool {
        self.handle.strong_count() > 0
    }
}

pub(crate) struct Reclaimed {
    pub(crate) id: ObjectId,
    pub(crate) finalizer: Finalizer,
}

/// Everything one pass reclaimed, plus the signal the pass waits on.
pub(crate) struct FinalizationBatch {
    pub(crate) cycle: u64,
    pub(crate) reclaimed: Vec<Reclaimed>,
    pub(crate) done: oneshot::Sender<()>,
}

#[derive(Default)]
struct HeapInner {
    next_id: ObjectId,
    registrations: HashMap<ObjectId, Registration>,
    num_gc: u64,
    mallocs: u64,
    frees: u64,
    heap_alloc_bytes: u64,
    total_alloc_bytes: u64,
    last_pause_ns: u64,
    pause_total_ns: u64,
    last_gc_unix_ns: u64,
}

/// Modeled collector.
///
/// Tracked objects are plain `Arc`s owned by the caller. The heap keeps a weak
/// handle and the finalizer. An object is unreachable once its last strong
/// handle is gone, but that is only noticed by [`Heap::collect`]. Finalizers
/// are never run on the collecting stack: they are queued to the
/// [`FinalizerQueue`](super::queue::FinalizerQueue).
pub struct Heap {
    inner: Mutex<HeapInner>,
    queue: mpsc::UnboundedSender<FinalizationBatch>,
}

/// Outcome of one forced pass.
#[derive(Debug)]
pub struct CollectionReport {
    /// 1-based number of this pass.
    pub cycle: u64,
    pub reclaimed: usize,
    completion: Option<oneshot::Receiver<()>>,
}

impl CollectionReport {
    /// A pass that reclaimed nothing.
    pub fn idle(cycle: u64) -> Self {
        Self {
            cycle,
            reclaimed: 0,
            completion: None,
        }
    }

    /// Resolves once every finalizer queued by this pass has run. Resolves
    /// immediately if nothing was queued or the queue is gone.
    pub async fn finalized(self) {
        if let Some(done) = self.completion {
            let _ = done.await;
        }
    }
}

/// "Force a full collection pass now." Synchronous: returns after the pass.
pub trait Collector: Send + Sync + 'static {
    fn force_collection(&self) -> CollectionReport;
}

impl Heap {
    pub fn new() -> (Self, super::queue::FinalizerQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        let heap = Self {
            inner: Mutex::new(HeapInner::default()),
            queue: tx,
        };
        (heap, super::queue::FinalizerQueue::new(rx))
    }

    fn lock(&self) -> MutexGuard<'_, HeapInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track `object` and attach a finalizer to it.
    ///
    /// Registering the same object twice attaches two independent finalizers.
    pub fn register<T, F>(&self, object: &Arc<T>, finalizer: F) -> ObjectId
    where
        T: Any + Send + Sync,
        F: FnOnce(&Heap, ObjectId) + Send + 'static,
    {
        let handle: Weak<T> = Arc::downgrade(object);
        let handle: Weak<dyn Any + Send + Sync> = handle;
        let bytes = std::mem::size_of::<T>().max(1) as u64;

        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.registrations.insert(
            id,
            Registration {
                handle,
                bytes,
                finalizer: Box::new(finalizer),
            },
        );
        inner.mallocs += 1;
        inner.heap_alloc_bytes += bytes;
        inner.total_alloc_bytes += bytes;
        drop(inner);

        debug!(object = id, bytes, "finalizer registered");
        id
    }

    /// Run one full pass.
    ///
    /// Unreachable registrations are removed before their finalizers are
    /// queued, so nothing is finalized twice.
    pub fn collect(&self) -> CollectionReport {
        let started = Instant::now();

        let mut inner = self.lock();
        inner.num_gc += 1;
        let cycle = inner.num_gc;

        let dead: Vec<ObjectId> = inner
            .registrations
            .iter()
            .filter(|(_, reg)| !reg.reachable())
            .map(|(id, _)| *id)
            .collect();

        let mut reclaimed = Vec::with_capacity(dead.len());
        for id in dead {
            if let Some(reg) = inner.registrations.remove(&id) {
                inner.heap_alloc_bytes = inner.heap_alloc_bytes.saturating_sub(reg.bytes);
                inner.frees += 1;
                reclaimed.push(Reclaimed {
                    id,
                    finalizer: reg.finalizer,
                });
            }
        }

        let pause = started.elapsed().as_nanos() as u64;
        inner.last_pause_ns = pause;
        inner.pause_total_ns += pause;
        inner.last_gc_unix_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        drop(inner);

        let count = reclaimed.len();
        debug!(cycle, reclaimed = count, pause_ns = pause, "collection pass");
        if count == 0 {
            return CollectionReport::idle(cycle);
        }

        let (done, completion) = oneshot::channel();
        let batch = FinalizationBatch {
            cycle,
            reclaimed,
            done,
        };
        if self.queue.send(batch).is_err() {
            debug!(cycle, "finalizer queue closed, dropping finalizers");
            return CollectionReport {
                cycle,
                reclaimed: count,
                completion: None,
            };
        }

        CollectionReport {
            cycle,
            reclaimed: count,
            completion: Some(completion),
        }
    }

    /// Fresh counters. Never cached.
    pub fn stats(&self) -> StatsSnapshot {
        let inner = self.lock();
        let live = inner.registrations.values().filter(|r| r.reachable()).count();
        StatsSnapshot {
            num_gc: inner.num_gc,
            live_objects: live as u64,
            pending_finalizers: inner.registrations.len() as u64,
            heap_alloc_bytes: inner.heap_alloc_bytes,
            total_alloc_bytes: inner.total_alloc_bytes,
            mallocs: inner.mallocs,
            frees: inner.frees,
            last_pause_ns: inner.last_pause_ns,
            pause_total_ns: inner.pause_total_ns,
            last_gc_unix_ns: inner.last_gc_unix_ns,
        }
    }

    /// Registered objects whose finalizer has not been queued yet.
    pub fn pending_finalizers(&self) -> usize {
        self.lock().registrations.len()
    }

    pub fn cycles(&self) -> u64 {
        self.lock().num_gc
    }
}

impl Collector for Heap {
    fn force_collection(&self) -> CollectionReport {
        self.collect()
    }
}
