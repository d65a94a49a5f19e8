//! HTTP gateway and ingestion entrypoint for the event pipeline.

pub mod extractors;
pub mod ingestor;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use ingestor::{IngestReceipt, Ingestor, QueueState, QueueStatus};
pub use middleware::rate_limit::{Admission, RateLimitConfig, RateLimiter};
pub use routes::router;
pub use state::AppState;
