//! Queue configuration.

use engine_core::limits::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_PROCESSING_BATCH_SIZE, DEFAULT_QUEUE_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ingest queue and polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum queued events before batches are refused
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Events taken per processing tick
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Processing tick interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_batch_size() -> usize {
    DEFAULT_PROCESSING_BATCH_SIZE
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl QueueConfig {
    /// Tick interval, at least 1ms.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
