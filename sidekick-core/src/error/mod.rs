//! Error Handling Module
//!
//! - Core error type (`SidekickError`, `ErrorCategory`)
//! - User-facing summaries and suggestions for terminal rendering
//! - Conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use sidekick_core::error::{SidekickError, ErrorCategory};
//!
//! let error = SidekickError::api_error(404, "Not found");
//! assert_eq!(error.category(), ErrorCategory::Client);
//! assert!(!error.is_retryable());
//! ```

mod conversions;
pub mod helpers;
pub mod types;

pub use helpers::*;
pub use types::*;
