//! ClickHouse storage sink for the event pipeline.

pub mod client;
pub mod config;
pub mod health;
pub mod insert;
pub mod schema;
pub mod sink;

pub use client::*;
pub use config::*;
pub use sink::ClickHouseSink;
