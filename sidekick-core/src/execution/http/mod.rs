//! HTTP Utilities
//!
//! - HTTP client construction from `HttpConfig`
//! - Header building for authenticated JSON requests

pub mod client;
pub mod headers;

pub use client::*;
pub use headers::*;
