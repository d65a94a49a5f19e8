//! Test doubles for the pipeline's external collaborators.

use async_trait::async_trait;
use engine_core::{ProcessedEvent, Result, StorageSink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use worker::{DeviceFacts, Enrichment, EnrichmentLookup, GeoFacts};

/// Sink that captures appended events in memory.
///
/// Failure mode makes every append fail until switched off.
#[derive(Clone, Default)]
pub struct MockSink {
    events: Arc<Mutex<Vec<ProcessedEvent>>>,
    should_fail: Arc<Mutex<bool>>,
    attempts: Arc<AtomicUsize>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events appended so far.
    pub fn captured_events(&self) -> Vec<ProcessedEvent> {
        self.events.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    /// Append calls, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }
}

#[async_trait]
impl StorageSink for MockSink {
    async fn append(&self, events: Vec<ProcessedEvent>) -> Result<usize> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if *self.should_fail.lock() {
            return Err(engine_core::Error::sink_unavailable("Mock sink failure"));
        }

        let count = events.len();
        self.events.lock().extend(events);
        Ok(count)
    }
}

/// Enrichment lookup returning the same facts for every event.
#[derive(Clone)]
pub struct StaticEnrichment {
    enrichment: Enrichment,
    should_fail: Arc<Mutex<bool>>,
    calls: Arc<AtomicUsize>,
}

impl StaticEnrichment {
    pub fn new(enrichment: Enrichment) -> Self {
        Self {
            enrichment,
            should_fail: Arc::new(Mutex::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }
}

impl Default for StaticEnrichment {
    /// US / New York desktop Chrome on macOS.
    fn default() -> Self {
        Self::new(Enrichment {
            geo: GeoFacts {
                country: Some("US".into()),
                city: Some("New York".into()),
            },
            device: DeviceFacts {
                device_type: Some("desktop".into()),
                browser: Some("Chrome".into()),
                os: Some("Mac OSX".into()),
            },
        })
    }
}

#[async_trait]
impl EnrichmentLookup for StaticEnrichment {
    async fn resolve(&self, _ip_address: &str, _user_agent: Option<&str>) -> Result<Enrichment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.should_fail.lock() {
            return Err(engine_core::Error::enrichment("Mock lookup failure"));
        }
        Ok(self.enrichment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use engine_core::ValidatedEvent;

    fn processed(id: &str) -> ProcessedEvent {
        let event = ValidatedEvent {
            event_id: id.into(),
            tenant_id: "tenant-a".into(),
            event_name: "page_view".into(),
            user_id: None,
            session_id: None,
            timestamp: Utc::now(),
            properties: Default::default(),
            ingested_at: Utc::now(),
        };
        ProcessedEvent::new(event, Utc::now())
    }

    #[tokio::test]
    async fn test_mock_sink_captures_events() {
        let sink = MockSink::new();

        let written = sink.append(vec![processed("e1")]).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(sink.event_count(), 1);
        assert_eq!(sink.captured_events()[0].event_id(), "e1");
    }

    #[tokio::test]
    async fn test_mock_sink_failure_mode() {
        let sink = MockSink::new();
        sink.set_should_fail(true);

        assert!(sink.append(vec![processed("e1")]).await.is_err());
        assert_eq!(sink.attempts(), 1);
        assert_eq!(sink.event_count(), 0);
    }
}
