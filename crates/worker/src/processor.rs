//! Event processor: enrich, sessionize, deduplicate, persist.

use engine_core::{
    DedupOutcome, DeduplicationGate, Error, ProcessedEvent, Result, SessionKey, SessionStore,
    SharedClock, StorageSink, ValidatedEvent,
};
use std::sync::Arc;
use std::time::Instant;
use telemetry::{health, metrics};
use tracing::{debug, error, warn};

use crate::config::ProcessingConfig;
use crate::enrichment::{Enrichment, EnrichmentLookup};

/// Turns dequeued events into processed events and appends them to the sink.
///
/// Session and dedup state is owned here and survives across batches.
pub struct EventProcessor {
    config: ProcessingConfig,
    sessions: Arc<SessionStore>,
    dedup: Arc<DeduplicationGate>,
    enrichment: Arc<dyn EnrichmentLookup>,
    sink: Arc<dyn StorageSink>,
    clock: SharedClock,
}

impl EventProcessor {
    /// Creates a processor with fresh session and dedup state.
    pub fn new(
        config: ProcessingConfig,
        enrichment: Arc<dyn EnrichmentLookup>,
        sink: Arc<dyn StorageSink>,
        clock: SharedClock,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(config.session_timeout()));
        let dedup = Arc::new(DeduplicationGate::new(
            config.dedup_horizon(),
            config.dedup_max_keys,
            clock.clone(),
        ));
        Self::with_state(config, sessions, dedup, enrichment, sink, clock)
    }

    /// Creates a processor over existing state.
    pub fn with_state(
        config: ProcessingConfig,
        sessions: Arc<SessionStore>,
        dedup: Arc<DeduplicationGate>,
        enrichment: Arc<dyn EnrichmentLookup>,
        sink: Arc<dyn StorageSink>,
        clock: SharedClock,
    ) -> Self {
        Self {
            config,
            sessions,
            dedup,
            enrichment,
            sink,
            clock,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn dedup(&self) -> &DeduplicationGate {
        &self.dedup
    }

    /// Processes a batch and appends the survivors to the sink.
    ///
    /// Returns the events that were persisted. A sink that keeps failing
    /// after all retries drops the batch and returns `SinkUnavailable`.
    pub async fn process(&self, batch: Vec<ValidatedEvent>) -> Result<Vec<ProcessedEvent>> {
        let started = Instant::now();
        let processed = self.prepare(batch).await;

        if processed.is_empty() {
            return Ok(processed);
        }

        self.persist(processed.clone()).await?;

        metrics()
            .batch_processing_latency_ms
            .observe(started.elapsed().as_millis() as u64);
        Ok(processed)
    }

    /// Enriches, sessionizes and deduplicates a batch without persisting it.
    ///
    /// Events are handled in timestamp order (stable for ties). A failing
    /// event is logged and skipped; the rest of the batch continues.
    pub async fn prepare(&self, mut batch: Vec<ValidatedEvent>) -> Vec<ProcessedEvent> {
        batch.sort_by_key(|event| event.timestamp);

        let mut processed = Vec::with_capacity(batch.len());
        for event in batch {
            let event_id = event.event_id.clone();
            match self.process_one(event).await {
                Ok(Some(event)) => processed.push(event),
                Ok(None) => {}
                Err(e) => {
                    metrics().events_failed_processing.inc();
                    error!(event_id = %event_id, error = %e, "Event processing failed, skipping");
                }
            }
        }

        metrics().events_processed.inc_by(processed.len() as u64);
        processed
    }

    /// Runs one event through the pipeline. `None` means it was a duplicate.
    async fn process_one(&self, event: ValidatedEvent) -> Result<Option<ProcessedEvent>> {
        let enrichment = self.enrich(&event).await?;

        let mut processed = ProcessedEvent::new(event, self.clock.now());
        processed.geo_country = enrichment.geo.country;
        processed.geo_city = enrichment.geo.city;
        processed.device_type = enrichment.device.device_type;
        processed.browser = enrichment.device.browser;
        processed.os = enrichment.device.os;

        self.sessionize(&mut processed);

        let outcome = self
            .dedup
            .check_and_record(&processed.event.event_id, processed.event.timestamp)
            .await;
        if outcome == DedupOutcome::Duplicate {
            metrics().events_duplicate.inc();
            debug!(event_id = %processed.event.event_id, "Duplicate event dropped");
            return Ok(None);
        }

        Ok(Some(processed))
    }

    /// Resolves enrichment within the configured budget.
    ///
    /// Lookup errors and timeouts degrade to no enrichment. A lookup that
    /// panics fails the event.
    async fn enrich(&self, event: &ValidatedEvent) -> Result<Enrichment> {
        let lookup = self.enrichment.clone();
        let ip_address = event.ip_address().to_string();
        let user_agent = event.user_agent().map(str::to_string);
        let budget = self.config.enrichment_timeout();

        let task = tokio::spawn(async move {
            tokio::time::timeout(budget, lookup.resolve(&ip_address, user_agent.as_deref())).await
        });

        match task.await {
            Ok(Ok(Ok(enrichment))) => Ok(enrichment),
            Ok(Ok(Err(e))) => {
                metrics().enrichment_failures.inc();
                warn!(event_id = %event.event_id, error = %e, "Enrichment lookup failed");
                Ok(Enrichment::default())
            }
            Ok(Err(_)) => {
                metrics().enrichment_failures.inc();
                warn!(
                    event_id = %event.event_id,
                    timeout_ms = budget.as_millis() as u64,
                    "Enrichment lookup timed out"
                );
                Ok(Enrichment::default())
            }
            Err(e) => Err(Error::processing(format!("enrichment task failed: {e}"))),
        }
    }

    fn sessionize(&self, processed: &mut ProcessedEvent) {
        let Some(session_id) = processed.event.session_id.as_deref() else {
            return;
        };

        let key = SessionKey::new(processed.event.tenant_id.as_str(), session_id);
        let update = self
            .sessions
            .observe(&key, processed.event.timestamp, self.clock.now());

        processed.session_start = Some(update.session_start);
        processed.session_duration_seconds = Some(update.duration_seconds);
    }

    /// Appends to the sink, retrying with linear backoff.
    async fn persist(&self, events: Vec<ProcessedEvent>) -> Result<usize> {
        let count = events.len();
        let mut last_error = None;

        for attempt in 0..=self.config.sink_max_retries {
            if attempt > 0 {
                let backoff = self.config.sink_retry_backoff() * attempt;
                warn!(
                    attempt = attempt,
                    backoff_ms = %backoff.as_millis(),
                    "Retrying sink append"
                );
                tokio::time::sleep(backoff).await;
            }

            let started = Instant::now();
            match self.sink.append(events.clone()).await {
                Ok(written) => {
                    metrics().sink_appends.inc();
                    metrics().events_persisted.inc_by(written as u64);
                    metrics()
                        .sink_latency_ms
                        .observe(started.elapsed().as_millis() as u64);
                    return Ok(written);
                }
                Err(e) => {
                    metrics().sink_errors.inc();
                    last_error = Some(e);
                }
            }
        }

        metrics().batches_dropped.inc();
        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        health().sink.set_unhealthy(reason.clone());
        error!(count = count, error = %reason, "Sink append failed after retries, dropping batch");

        Err(Error::sink_unavailable(reason))
    }

    /// Evicts idle sessions and settled dedup keys. Returns evicted sessions.
    pub async fn sweep(&self) -> usize {
        let evicted = self.sessions.evict_idle(self.clock.now());
        self.dedup.evict_settled().await;

        metrics().active_sessions.set(self.sessions.len() as u64);
        if evicted > 0 {
            debug!(evicted = evicted, active = self.sessions.len(), "Evicted idle sessions");
        }
        evicted
    }
}
