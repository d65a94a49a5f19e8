//! Worker scheduler for the processing loop and background tasks.

use ingest_queue::QueueConsumer;
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ProcessingConfig;
use crate::consumer::ProcessingLoop;
use crate::processor::EventProcessor;

/// Owns the background tasks of the processing side.
pub struct WorkerScheduler {
    config: ProcessingConfig,
    processor: Arc<EventProcessor>,
    consumer: QueueConsumer,
    poll_interval: Duration,
}

impl WorkerScheduler {
    pub fn new(
        config: ProcessingConfig,
        processor: Arc<EventProcessor>,
        consumer: QueueConsumer,
        poll_interval: Duration,
    ) -> Self {
        Self {
            config,
            processor,
            consumer,
            poll_interval,
        }
    }

    /// Starts the processing loop, the state sweeper and the metrics logger.
    ///
    /// All tasks exit once `shutdown` is cancelled.
    pub fn start(self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        let processing = ProcessingLoop::new(
            self.consumer.clone(),
            self.processor.clone(),
            self.poll_interval,
        );
        let token = shutdown.clone();
        handles.push(tokio::spawn(async move {
            processing.run(token).await;
        }));

        let processor = self.processor.clone();
        let sweep_interval = self.config.sweep_interval();
        let token = shutdown.clone();
        handles.push(tokio::spawn(async move {
            run_sweeper(processor, sweep_interval, token).await;
        }));

        let log_interval = self.config.metrics_log_interval();
        let token = shutdown;
        handles.push(tokio::spawn(async move {
            run_metrics_log(log_interval, token).await;
        }));

        info!("Background workers started");
        handles
    }
}

async fn run_sweeper(processor: Arc<EventProcessor>, every: Duration, shutdown: CancellationToken) {
    let mut ticker = interval(every);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        processor.sweep().await;
    }
}

async fn run_metrics_log(every: Duration, shutdown: CancellationToken) {
    let mut ticker = interval(every);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let snapshot = metrics().snapshot();
        info!(
            events_received = snapshot.events_received,
            events_admitted = snapshot.events_admitted,
            events_processed = snapshot.events_processed,
            events_duplicate = snapshot.events_duplicate,
            events_persisted = snapshot.events_persisted,
            sink_errors = snapshot.sink_errors,
            queue_depth = snapshot.queue_depth,
            active_sessions = snapshot.active_sessions,
            batch_latency_mean_ms = snapshot.batch_processing_latency_mean_ms,
            "Pipeline metrics"
        );
    }
}
