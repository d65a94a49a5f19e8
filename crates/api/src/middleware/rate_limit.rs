//! Per-tenant admission control.

use chrono::{DateTime, Duration, Utc};
use engine_core::limits::{DEFAULT_RATE_LIMIT, RATE_LIMIT_WINDOW_SECS};
use engine_core::{Error, RateLimitErrorCode, RateLimitInfo, Result, SharedClock};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Admissions per tenant per window
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,
}

fn default_limit() -> u64 {
    DEFAULT_RATE_LIMIT
}

fn default_window_secs() -> i64 {
    RATE_LIMIT_WINDOW_SECS
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_secs)
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed(RateLimitInfo),
    Rejected(RateLimitInfo),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    pub fn info(&self) -> &RateLimitInfo {
        match self {
            Self::Allowed(info) | Self::Rejected(info) => info,
        }
    }
}

struct Window {
    start: DateTime<Utc>,
    count: u64,
}

/// Fixed-window rate limiter, one window per tenant.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    config: RateLimitConfig,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: SharedClock) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Counts one admission for `tenant_id` if budget remains.
    ///
    /// A window older than the window length is restarted at `now`.
    pub fn admit(&self, tenant_id: &str) -> Admission {
        let now = self.clock.now();
        let length = self.config.window();
        let limit = self.config.limit;

        let mut windows = self.windows.lock();
        let window = windows
            .entry(tenant_id.to_string())
            .or_insert(Window { start: now, count: 0 });

        if now - window.start > length {
            window.start = now;
            window.count = 0;
        }

        let reset_at = window.start + length;

        if window.count >= limit {
            return Admission::Rejected(RateLimitInfo {
                limit,
                remaining: 0,
                reset_at,
                retry_after: (reset_at - now).num_seconds().max(0) as u64,
            });
        }

        window.count += 1;
        Admission::Allowed(RateLimitInfo {
            limit,
            remaining: limit - window.count,
            reset_at,
            retry_after: 0,
        })
    }

    /// Like [`admit`](Self::admit), turning a rejection into `RATE_001`.
    pub fn check(&self, tenant_id: &str) -> Result<RateLimitInfo> {
        match self.admit(tenant_id) {
            Admission::Allowed(info) => Ok(info),
            Admission::Rejected(info) => Err(Error::rate_limit(
                RateLimitErrorCode::Exceeded,
                format!(
                    "Rate limit exceeded: {} events per {}s",
                    info.limit, self.config.window_secs
                ),
                info,
            )),
        }
    }

    /// Drops windows that started more than `max_age` ago. Returns how many.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let mut windows = self.windows.lock();
        let before = windows.len();

        windows.retain(|_, window| now - window.start <= max_age);
        before - windows.len()
    }

    pub fn tenant_count(&self) -> usize {
        self.windows.lock().len()
    }
}

/// Shared rate limiter state.
pub type SharedRateLimiter = Arc<RateLimiter>;
