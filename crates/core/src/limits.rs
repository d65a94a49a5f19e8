//! Limits and timing constants for the event pipeline.
//!
//! Constants used at runtime as defaults: the configuration layer in the
//! binary can override the window, timeout and queue values.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so `MAX_EVENT_NAME_LEN` is duplicated on `RawEvent`. Keep both in sync.

// === Batch Limits ===

/// Maximum events per ingested batch.
pub const MAX_BATCH_EVENTS: usize = 1000;

/// Maximum event name length (chars).
pub const MAX_EVENT_NAME_LEN: usize = 100;

// === Admission ===

/// Admissions per tenant per window.
pub const DEFAULT_RATE_LIMIT: u64 = 10_000;

/// Admission window length (1 hour).
pub const RATE_LIMIT_WINDOW_SECS: i64 = 3600;

// === Processing ===

/// Session timeout measured from session start (30 minutes).
pub const SESSION_TIMEOUT_SECS: i64 = 1800;

/// How long a dedup key is remembered (24 hours).
pub const DEDUP_HORIZON_SECS: i64 = 24 * 3600;

/// Upper bound on remembered dedup keys.
pub const DEDUP_MAX_KEYS: u64 = 1_000_000;

/// Events pulled from the queue per tick.
pub const DEFAULT_PROCESSING_BATCH_SIZE: usize = 100;

/// Processing loop cadence.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Queue capacity before the gateway starts shedding batches.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;

/// Enrichment lookup budget per event.
pub const DEFAULT_ENRICHMENT_TIMEOUT_MS: u64 = 500;

/// IP address assumed when an event carries none.
pub const DEFAULT_IP_ADDRESS: &str = "127.0.0.1";
