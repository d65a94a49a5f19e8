//! Shared helpers for the pipeline integration tests.

pub mod fixtures;
pub mod mocks;
