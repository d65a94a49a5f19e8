//! Application state shared across handlers.

use engine_core::SharedClock;
use ingest_queue::EventProducer;
use std::sync::Arc;
use tracing::debug;

use crate::ingestor::Ingestor;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter, SharedRateLimiter};

/// How often idle rate limit windows are swept.
const RATE_LIMIT_CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(300);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Ingestion entrypoint
    pub ingestor: Arc<Ingestor>,
    /// Rate limiter
    pub rate_limiter: SharedRateLimiter,
}

impl AppState {
    pub fn new(
        producer: Arc<dyn EventProducer>,
        rate_config: RateLimitConfig,
        clock: SharedClock,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(rate_config, clock.clone()));
        Self {
            ingestor: Arc::new(Ingestor::new(rate_limiter.clone(), producer, clock)),
            rate_limiter,
        }
    }

    /// Start the rate limiter cleanup background task.
    ///
    /// Windows older than two window lengths are dropped; a returning tenant
    /// simply starts a fresh window.
    pub fn start_rate_limiter_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let rate_limiter = self.rate_limiter.clone();
        let max_age = rate_limiter.config().window() * 2;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = rate_limiter.cleanup(max_age);
                if removed > 0 {
                    debug!(removed = removed, "Dropped idle rate limit windows");
                }
            }
        })
    }
}
