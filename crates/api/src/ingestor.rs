//! Transport-agnostic ingestion entrypoint.
//!
//! Admission order for a batch:
//! 1. Batch size (1..=1000), before any other work
//! 2. Tenant rate limit (one slot per batch)
//! 3. Per-event validation; any failure rejects the whole batch
//! 4. Enqueue; a full queue rejects the whole batch

use chrono::{DateTime, Utc};
use engine_core::limits::MAX_BATCH_EVENTS;
use engine_core::{
    Error, EventValidator, RateLimitInfo, RawEvent, Result, SharedClock, ValidatedEvent,
    ValidationErrorCode,
};
use ingest_queue::EventProducer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::middleware::rate_limit::SharedRateLimiter;

/// Generates an opaque processing ID for an admitted batch.
pub fn generate_processing_id(now: DateTime<Utc>) -> String {
    format!("proc_{}_{}", now.timestamp(), Uuid::new_v4().simple())
}

/// Confirmation of an admitted batch.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub events_received: usize,
    pub processing_id: String,
    pub queue_depth: usize,
    pub rate_limit: RateLimitInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueState {
    Idle,
    Processing,
}

/// Snapshot of the ingest queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queue_size: usize,
    pub status: QueueState,
}

/// Admits batches from any transport.
pub struct Ingestor {
    rate_limiter: SharedRateLimiter,
    validator: EventValidator,
    producer: Arc<dyn EventProducer>,
    clock: SharedClock,
}

impl Ingestor {
    pub fn new(
        rate_limiter: SharedRateLimiter,
        producer: Arc<dyn EventProducer>,
        clock: SharedClock,
    ) -> Self {
        Self {
            rate_limiter,
            validator: EventValidator::new(clock.clone()),
            producer,
            clock,
        }
    }

    pub fn rate_limiter(&self) -> &SharedRateLimiter {
        &self.rate_limiter
    }

    /// Admits a batch for `tenant_id` or rejects it as a whole.
    pub async fn ingest(&self, tenant_id: &str, events: Vec<RawEvent>) -> Result<IngestReceipt> {
        let start = Instant::now();
        let count = events.len();

        metrics().batches_received.inc();
        metrics().events_received.inc_by(count as u64);

        let result = self.admit(tenant_id, events).await;
        if result.is_err() {
            metrics().batches_rejected.inc();
        }
        let receipt = result?;

        let latency_ms = start.elapsed().as_millis() as u64;
        metrics().ingest_latency_ms.observe(latency_ms);

        info!(
            tenant_id = %tenant_id,
            count = receipt.events_received,
            processing_id = %receipt.processing_id,
            queue_depth = receipt.queue_depth,
            latency_ms = latency_ms,
            "Batch admitted"
        );
        Ok(receipt)
    }

    async fn admit(&self, tenant_id: &str, events: Vec<RawEvent>) -> Result<IngestReceipt> {
        if events.is_empty() {
            return Err(Error::validation_code(
                ValidationErrorCode::EmptyBatch,
                "Batch must contain at least one event",
            ));
        }

        if events.len() > MAX_BATCH_EVENTS {
            return Err(Error::validation_code(
                ValidationErrorCode::BatchTooLarge,
                format!(
                    "Batch has {} events, exceeds {} limit",
                    events.len(),
                    MAX_BATCH_EVENTS
                ),
            ));
        }

        let rate_limit = self.rate_limiter.check(tenant_id).map_err(|e| {
            metrics().rate_limited_requests.inc();
            warn!(tenant_id = %tenant_id, count = events.len(), "Rate limit exceeded");
            e
        })?;

        let validated = self.validate_all(tenant_id, &events)?;
        let count = validated.len();

        let sent = self.producer.send(validated).await.map_err(|e| {
            if matches!(e, Error::QueueFull { .. }) {
                metrics().queue_full_rejections.inc();
                warn!(tenant_id = %tenant_id, count = count, "Ingest queue full, batch refused");
            }
            e
        })?;

        metrics().events_admitted.inc_by(sent.events_sent as u64);

        Ok(IngestReceipt {
            events_received: sent.events_sent,
            processing_id: generate_processing_id(self.clock.now()),
            queue_depth: sent.queue_depth,
            rate_limit,
        })
    }

    /// Validates every event; the first failure rejects the batch.
    fn validate_all(&self, tenant_id: &str, events: &[RawEvent]) -> Result<Vec<ValidatedEvent>> {
        let mut validated = Vec::with_capacity(events.len());

        for (index, raw) in events.iter().enumerate() {
            match self.validator.validate(raw, tenant_id) {
                Ok(event) => validated.push(event),
                Err(Error::ValidationWithCode {
                    code,
                    message,
                    http_status,
                }) => {
                    metrics().events_failed_validation.inc();
                    debug!(tenant_id = %tenant_id, index = index, reason = %message, "Event rejected");
                    return Err(Error::ValidationWithCode {
                        code,
                        message: format!("Event {}: {}", index, message),
                        http_status,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(validated)
    }

    /// Current queue depth and derived state.
    pub fn queue_status(&self) -> QueueStatus {
        let queue_size = self.producer.depth();
        QueueStatus {
            queue_size,
            status: if queue_size == 0 {
                QueueState::Idle
            } else {
                QueueState::Processing
            },
        }
    }

    /// Liveness stamp; independent of queue and session state.
    pub fn health(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
