//! Processing side of the event pipeline.
//!
//! - Processing loop (ingest queue → processor → storage sink)
//! - Enrichment (geo and device facts)
//! - Sweeper (idle sessions, settled dedup keys)
//! - Metrics snapshot logging

pub mod config;
pub mod consumer;
pub mod enrichment;
pub mod processor;
pub mod scheduler;

pub use config::ProcessingConfig;
pub use consumer::ProcessingLoop;
pub use enrichment::*;
pub use processor::EventProcessor;
pub use scheduler::WorkerScheduler;
