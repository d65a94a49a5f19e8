//! Processing configuration.

use engine_core::limits::{
    DEDUP_HORIZON_SECS, DEDUP_MAX_KEYS, DEFAULT_ENRICHMENT_TIMEOUT_MS, SESSION_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Event processor and background sweeper settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Session timeout measured from session start
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: i64,
    /// How long processed event keys are remembered
    #[serde(default = "default_dedup_horizon_secs")]
    pub dedup_horizon_secs: i64,
    #[serde(default = "default_dedup_max_keys")]
    pub dedup_max_keys: u64,
    /// Per-event enrichment budget in milliseconds
    #[serde(default = "default_enrichment_timeout_ms")]
    pub enrichment_timeout_ms: u64,
    /// Sink append retries before a batch is dropped
    #[serde(default = "default_sink_max_retries")]
    pub sink_max_retries: u32,
    /// Linear backoff step between sink attempts in milliseconds
    #[serde(default = "default_sink_retry_backoff_ms")]
    pub sink_retry_backoff_ms: u64,
    /// Idle session and settled dedup key eviction cadence
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Metrics snapshot logging cadence
    #[serde(default = "default_metrics_log_interval_secs")]
    pub metrics_log_interval_secs: u64,
}

fn default_session_timeout_secs() -> i64 {
    SESSION_TIMEOUT_SECS
}

fn default_dedup_horizon_secs() -> i64 {
    DEDUP_HORIZON_SECS
}

fn default_dedup_max_keys() -> u64 {
    DEDUP_MAX_KEYS
}

fn default_enrichment_timeout_ms() -> u64 {
    DEFAULT_ENRICHMENT_TIMEOUT_MS
}

fn default_sink_max_retries() -> u32 {
    3
}

fn default_sink_retry_backoff_ms() -> u64 {
    100
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_metrics_log_interval_secs() -> u64 {
    60
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: default_session_timeout_secs(),
            dedup_horizon_secs: default_dedup_horizon_secs(),
            dedup_max_keys: default_dedup_max_keys(),
            enrichment_timeout_ms: default_enrichment_timeout_ms(),
            sink_max_retries: default_sink_max_retries(),
            sink_retry_backoff_ms: default_sink_retry_backoff_ms(),
            sweep_interval_secs: default_sweep_interval_secs(),
            metrics_log_interval_secs: default_metrics_log_interval_secs(),
        }
    }
}

impl ProcessingConfig {
    pub fn session_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_timeout_secs)
    }

    pub fn dedup_horizon(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.dedup_horizon_secs)
    }

    pub fn enrichment_timeout(&self) -> Duration {
        Duration::from_millis(self.enrichment_timeout_ms)
    }

    pub fn sink_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.sink_retry_backoff_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn metrics_log_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_log_interval_secs.max(1))
    }
}
