//! Processing-side handle: can only dequeue.

use engine_core::ValidatedEvent;
use std::sync::Arc;

use crate::queue::IngestQueue;

/// Dequeue-only view of an [`IngestQueue`].
#[derive(Debug, Clone)]
pub struct QueueConsumer {
    queue: Arc<IngestQueue>,
    batch_size: usize,
}

impl QueueConsumer {
    pub fn new(queue: Arc<IngestQueue>, batch_size: usize) -> Self {
        Self {
            queue,
            batch_size: batch_size.max(1),
        }
    }

    /// Takes up to the configured batch size of the oldest events.
    ///
    /// Returns an empty vec when nothing is queued; never waits.
    pub fn fetch_batch(&self) -> Vec<ValidatedEvent> {
        self.queue.dequeue_batch(self.batch_size)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn depth(&self) -> usize {
        self.queue.depth()
    }
}
