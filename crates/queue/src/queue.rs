//! Bounded FIFO buffer shared by the gateway and the processing loop.

use engine_core::{Error, Result, ValidatedEvent};
use parking_lot::Mutex;
use std::collections::VecDeque;
use telemetry::metrics;

/// Ordered, bounded hand-off buffer.
///
/// Enqueue and dequeue take the same lock, so an event is handed out at
/// most once and a refused batch leaves no trace. Contents do not survive
/// a process restart.
#[derive(Debug)]
pub struct IngestQueue {
    events: Mutex<VecDeque<ValidatedEvent>>,
    capacity: usize,
}

impl IngestQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Appends the whole batch, or nothing if it would overflow capacity.
    pub fn enqueue(&self, batch: Vec<ValidatedEvent>) -> Result<usize> {
        let count = batch.len();
        let mut events = self.events.lock();

        if events.len() + count > self.capacity {
            return Err(Error::queue_full(format!(
                "Queue at capacity ({} queued, {} incoming, capacity {})",
                events.len(),
                count,
                self.capacity
            )));
        }

        events.extend(batch);
        metrics().queue_depth.set(events.len() as u64);
        Ok(count)
    }

    /// Removes and returns up to `max` of the oldest events.
    pub fn dequeue_batch(&self, max: usize) -> Vec<ValidatedEvent> {
        let mut events = self.events.lock();
        let take = max.min(events.len());
        let batch: Vec<ValidatedEvent> = events.drain(..take).collect();
        metrics().queue_depth.set(events.len() as u64);
        batch
    }

    pub fn depth(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
