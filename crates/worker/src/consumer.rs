//! Processing loop: drains the ingest queue on a fixed cadence.
//!
//! Each tick:
//! 1. Take up to `batch_size` events from the queue
//! 2. Hand them to the [`EventProcessor`]
//! 3. Log the outcome and wait for the next tick
//!
//! Cancellation is observed between ticks only, so a batch in flight is
//! always finished.

use ingest_queue::QueueConsumer;
use std::sync::Arc;
use std::time::Duration;
use telemetry::{health, metrics};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::processor::EventProcessor;

/// Periodic consumer of the ingest queue.
pub struct ProcessingLoop {
    consumer: QueueConsumer,
    processor: Arc<EventProcessor>,
    poll_interval: Duration,
}

impl ProcessingLoop {
    pub fn new(
        consumer: QueueConsumer,
        processor: Arc<EventProcessor>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            consumer,
            processor,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Runs until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            batch_size = self.consumer.batch_size(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Processing loop starting"
        );
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        health().processing.set_healthy();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            self.tick().await;
        }

        health().processing.set_unhealthy("stopped");
        info!(queue_depth = self.consumer.depth(), "Processing loop stopped");
    }

    /// Processes one batch. Returns how many events were dequeued.
    ///
    /// An empty queue is a no-op.
    pub async fn tick(&self) -> usize {
        let batch = self.consumer.fetch_batch();
        if batch.is_empty() {
            return 0;
        }

        let count = batch.len();
        metrics().events_dequeued.inc_by(count as u64);
        metrics().queue_depth.set(self.consumer.depth() as u64);

        match self.processor.process(batch).await {
            Ok(persisted) => {
                debug!(
                    dequeued = count,
                    persisted = persisted.len(),
                    queue_depth = self.consumer.depth(),
                    "Processed batch"
                );
            }
            Err(e) => {
                error!(dequeued = count, error = %e, "Batch processing failed");
            }
        }

        count
    }
}
