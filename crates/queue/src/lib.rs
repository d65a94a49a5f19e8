//! In-process hand-off between admission and processing.
//!
//! The gateway holds a [`QueueProducer`] (enqueue only) and the processing
//! loop a [`QueueConsumer`] (dequeue only); neither owns the queue.

pub mod config;
pub mod consumer;
pub mod producer;
pub mod queue;

pub use config::*;
pub use consumer::*;
pub use producer::*;
pub use queue::*;

use std::sync::Arc;

/// Creates a queue and returns its two ends.
pub fn channel(config: &QueueConfig) -> (QueueProducer, QueueConsumer) {
    let queue = Arc::new(IngestQueue::new(config.capacity));
    (
        QueueProducer::new(queue.clone()),
        QueueConsumer::new(queue, config.batch_size),
    )
}
