//! Core types, validation, sessionization and deduplication for the
//! multi-tenant event pipeline.

pub mod clock;
pub mod dedup;
pub mod error;
pub mod events;
pub mod limits;
pub mod session;
pub mod sink;
pub mod validation;

pub use clock::*;
pub use dedup::*;
pub use error::{
    Error, QueueErrorCode, RateLimitErrorCode, RateLimitInfo, Result, ValidationErrorCode,
};
pub use events::*;
pub use session::*;
pub use sink::*;
pub use validation::*;
