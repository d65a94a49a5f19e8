//! Internal telemetry for the event pipeline.
//!
//! Structured logging setup, in-process metrics, and a component health
//! registry consulted by the readiness probe.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
