//! Tracing helpers
//!
//! Sensitive-value masking and an HTTP request tracer used by API clients.
//! Subscriber installation lives in the binary; this crate only emits events.

pub mod http;

pub use http::{ApiTracer, format_headers_for_logging, mask_sensitive_value};

use std::time::Duration;

/// Compact human-readable duration for log lines.
pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs() > 0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if duration.as_millis() > 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{}μs", duration.as_micros())
    }
}
