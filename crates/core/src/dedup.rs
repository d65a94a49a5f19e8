//! Deduplication gate.
//!
//! Remembers which events have been processed for a bounded horizon.
//! Suppression is intra-process only: keys are lost on restart.

use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;

use crate::clock::SharedClock;
use crate::limits::{DEDUP_HORIZON_SECS, DEDUP_MAX_KEYS};

/// Derives the dedup key for an event.
///
/// Exact in `event_id` and `timestamp`: two keys are equal only for the same
/// event id at the same instant.
pub fn dedup_key(event_id: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "{}|{}.{:09}",
        event_id,
        timestamp.timestamp(),
        timestamp.timestamp_subsec_nanos()
    )
}

/// Result of passing an event through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// First sighting, key recorded
    Fresh,
    /// Key already recorded, drop the event
    Duplicate,
    /// Older than the horizon, presumed settled and not checked
    Settled,
}

impl DedupOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate)
    }
}

/// Short-lived membership check for processed events.
pub struct DeduplicationGate {
    seen: Cache<String, DateTime<Utc>>,
    horizon: Duration,
    clock: SharedClock,
}

impl DeduplicationGate {
    pub fn new(horizon: Duration, max_keys: u64, clock: SharedClock) -> Self {
        let ttl = horizon
            .to_std()
            .unwrap_or_else(|_| std::time::Duration::from_secs(DEDUP_HORIZON_SECS as u64));

        Self {
            seen: Cache::builder()
                .max_capacity(max_keys)
                .time_to_live(ttl)
                .build(),
            horizon,
            clock,
        }
    }

    /// Gate with the default 24h horizon.
    pub fn with_defaults(clock: SharedClock) -> Self {
        Self::new(Duration::seconds(DEDUP_HORIZON_SECS), DEDUP_MAX_KEYS, clock)
    }

    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    /// Checks the event against the gate and records it if unseen.
    ///
    /// Check and record are a single atomic step per key.
    pub async fn check_and_record(&self, event_id: &str, timestamp: DateTime<Utc>) -> DedupOutcome {
        if self.clock.now() - timestamp > self.horizon {
            return DedupOutcome::Settled;
        }

        let entry = self
            .seen
            .entry(dedup_key(event_id, timestamp))
            .or_insert(timestamp)
            .await;

        if entry.is_fresh() {
            DedupOutcome::Fresh
        } else {
            DedupOutcome::Duplicate
        }
    }

    /// Forgets keys whose event timestamp fell behind the horizon.
    pub async fn evict_settled(&self) {
        let cutoff = self.clock.now() - self.horizon;
        let stale: Vec<String> = self
            .seen
            .iter()
            .filter(|(_, ts)| *ts < cutoff)
            .map(|(key, _)| key.to_string())
            .collect();

        for key in stale {
            self.seen.invalidate(&key).await;
        }
        self.seen.run_pending_tasks().await;
    }

    /// Approximate number of remembered keys.
    pub fn len(&self) -> u64 {
        self.seen.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
