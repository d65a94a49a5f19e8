//! Request admission.

pub mod rate_limit;
