//! User-facing error helpers.
//!
//! Structured summaries and friendly suggestions suitable for terminal rendering.

use super::types::{ErrorCategory, SidekickError};

/// Error kind for presentation (coarse-grained)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    RateLimit,
    Quota,
    Client,
    Server,
    Network,
    Parsing,
    Configuration,
    Tool,
    Run,
    Unknown,
}

/// Structured error summary for terminal consumption
#[derive(Debug, Clone)]
pub struct ErrorSummary {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    /// Original API message when available; otherwise the error's display text
    pub message: String,
    pub suggestions: Vec<String>,
    /// Opaque JSON details (e.g. the API error body)
    pub details: Option<serde_json::Value>,
}

/// Summarize a `SidekickError` with friendly suggestions.
pub fn summarize_error(err: &SidekickError) -> ErrorSummary {
    ErrorSummary {
        kind: map_error_kind(err),
        status: err.status_code(),
        message: extract_raw_message(err),
        suggestions: suggest_fixes(err),
        details: match err {
            SidekickError::ApiError { details, .. } => details.clone(),
            _ => None,
        },
    }
}

/// Map a `SidekickError` to a presentation `ErrorKind`.
pub fn map_error_kind(err: &SidekickError) -> ErrorKind {
    if matches!(err, SidekickError::QuotaExceededError(_)) {
        return ErrorKind::Quota;
    }
    match err.category() {
        ErrorCategory::Authentication => ErrorKind::Auth,
        ErrorCategory::RateLimit => ErrorKind::RateLimit,
        ErrorCategory::Client => ErrorKind::Client,
        ErrorCategory::Server => ErrorKind::Server,
        ErrorCategory::Network => ErrorKind::Network,
        ErrorCategory::Parsing => ErrorKind::Parsing,
        ErrorCategory::Configuration => ErrorKind::Configuration,
        ErrorCategory::Tool => ErrorKind::Tool,
        ErrorCategory::Run => ErrorKind::Run,
        ErrorCategory::Io | ErrorCategory::Unknown => ErrorKind::Unknown,
    }
}

fn extract_raw_message(err: &SidekickError) -> String {
    match err {
        SidekickError::ApiError { message, .. } => message.clone(),
        SidekickError::AuthenticationError(msg)
        | SidekickError::RateLimitError(msg)
        | SidekickError::QuotaExceededError(msg)
        | SidekickError::TimeoutError(msg)
        | SidekickError::HttpError(msg)
        | SidekickError::InvalidInput(msg)
        | SidekickError::NotFound(msg)
        | SidekickError::ConfigurationError(msg) => msg.clone(),
        _ => err.to_string(),
    }
}

/// Suggest fixes based on the error category.
pub fn suggest_fixes(err: &SidekickError) -> Vec<String> {
    let mut tips = Vec::new();
    match map_error_kind(err) {
        ErrorKind::Auth => {
            tips.push("Verify OPENAI_API_KEY in your .env file or environment".to_string());
        }
        ErrorKind::RateLimit => {
            tips.push("Wait a moment and send the message again".to_string());
        }
        ErrorKind::Quota => {
            tips.push("Check billing and usage limits for your OpenAI project".to_string());
        }
        ErrorKind::Client => {
            if matches!(err, SidekickError::NotFound(_)) || err.status_code() == Some(404) {
                tips.push("Check that ASSISTANT_ID refers to an existing assistant".to_string());
            } else {
                tips.push("Check request parameters and required fields".to_string());
            }
        }
        ErrorKind::Server => {
            tips.push("The API is having trouble; retry shortly".to_string());
        }
        ErrorKind::Network => {
            tips.push("Check your network connection or OPENAI_BASE_URL".to_string());
        }
        ErrorKind::Configuration => {
            tips.push("Check environment variables and command-line flags".to_string());
        }
        ErrorKind::Tool => {
            tips.push("Check the workspace path and file permissions".to_string());
        }
        _ => {}
    }
    tips
}

/// Render a terminal-friendly string for an `ErrorSummary`.
pub fn format_summary(summary: &ErrorSummary, verbose: bool) -> String {
    let mut out = String::new();
    if let Some(code) = summary.status {
        out.push_str(&format!("Status: {code}\n"));
    }
    out.push_str(&format!("Message: {}\n", summary.message));
    if !summary.suggestions.is_empty() {
        out.push_str("Suggestions:\n");
        for s in &summary.suggestions {
            out.push_str(&format!("  - {s}\n"));
        }
    }
    if verbose && let Some(d) = &summary.details {
        out.push_str(&format!("Details: {d}\n"));
    }
    out
}
