//! Retry module
//! - policy.rs: generic policy-based retries
//! - backoff.rs: backoff crate-based retries

pub mod backoff;
pub mod policy;

pub use backoff::*;
pub use policy::*;
