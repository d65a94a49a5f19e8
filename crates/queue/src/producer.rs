//! Gateway-side handle: can only enqueue.

use async_trait::async_trait;
use engine_core::{Result, ValidatedEvent};
use std::sync::Arc;
use tracing::debug;

use crate::queue::IngestQueue;

/// Result of handing events to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub events_sent: usize,
    /// Queue depth right after the hand-off
    pub queue_depth: usize,
}

/// Trait for handing admitted events to the processing side.
///
/// The gateway depends only on this, so the in-process queue can be swapped
/// for a broker-backed implementation or a test double.
#[async_trait]
pub trait EventProducer: Send + Sync {
    /// Hands over the whole batch or none of it.
    async fn send(&self, events: Vec<ValidatedEvent>) -> Result<SendResult>;

    /// Events waiting to be processed.
    fn depth(&self) -> usize;
}

/// Enqueue-only view of an [`IngestQueue`].
#[derive(Debug, Clone)]
pub struct QueueProducer {
    queue: Arc<IngestQueue>,
}

impl QueueProducer {
    pub fn new(queue: Arc<IngestQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl EventProducer for QueueProducer {
    async fn send(&self, events: Vec<ValidatedEvent>) -> Result<SendResult> {
        let events_sent = self.queue.enqueue(events)?;
        let queue_depth = self.queue.depth();

        debug!(count = events_sent, queue_depth = queue_depth, "Enqueued events");

        Ok(SendResult {
            events_sent,
            queue_depth,
        })
    }

    fn depth(&self) -> usize {
        self.queue.depth()
    }
}
