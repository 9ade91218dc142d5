//! sidekick-core
//!
//! Shared runtime for the sidekick workspace: error taxonomy, retry, HTTP helpers,
//! configuration loading, tracing helpers and the Assistants wire types.
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod execution;
pub mod observability;
pub mod retry;
pub mod retry_api;
pub mod traits;
pub mod types;

pub use error::SidekickError;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, SidekickError>;
