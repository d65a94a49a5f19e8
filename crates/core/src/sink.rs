//! Storage sink contract.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::Result;
use crate::events::ProcessedEvent;

/// Durable append-only destination for processed events.
///
/// Implementations must accept absent enrichment fields.
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Appends a batch, returning how many events were written.
    async fn append(&self, events: Vec<ProcessedEvent>) -> Result<usize>;
}

/// Sink that keeps events in memory.
///
/// Used for local development (`clickhouse.url = "mock"`).
#[derive(Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<ProcessedEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProcessedEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl StorageSink for MemorySink {
    async fn append(&self, events: Vec<ProcessedEvent>) -> Result<usize> {
        let count = events.len();
        self.events.lock().extend(events);
        Ok(count)
    }
}
