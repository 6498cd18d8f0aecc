use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::heap::{FinalizationBatch, Heap};

/// Receiving end of the "reclaimed" notifications a [`Heap`] emits.
///
/// Either drain it by hand with [`run_pending`](Self::run_pending) or hand it
/// to a task with [`run`](Self::run).
pub struct FinalizerQueue {
    rx: mpsc::UnboundedReceiver<FinalizationBatch>,
}

impl FinalizerQueue {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<FinalizationBatch>) -> Self {
        Self { rx }
    }

    /// Run every finalizer already queued. Returns how many ran.
    pub fn run_pending(&mut self, heap: &Heap) -> usize {
        let mut ran = 0;
        while let Ok(batch) = self.rx.try_recv() {
            ran += execute(batch, heap);
        }
        ran
    }

    /// Consume batches until cancelled or until the heap is dropped.
    pub async fn run(mut self, heap: Arc<Heap>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                batch = self.rx.recv() => match batch {
                    Some(batch) => {
                        execute(batch, &heap);
                    }
                    None => break,
                },
            }
        }
        info!("finalizer queue stopped");
    }
}

fn execute(batch: FinalizationBatch, heap: &Heap) -> usize {
    let count = batch.reclaimed.len();
    for reclaimed in batch.reclaimed {
        debug!(cycle = batch.cycle, object = reclaimed.id, "running finalizer");
        (reclaimed.finalizer)(heap, reclaimed.id);
    }
    let _ = batch.done.send(());
    count
}
