//! Error types.

use thiserror::Error;

/// Coarse error classification used for retry decisions and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Client,
    Server,
    Network,
    Parsing,
    Configuration,
    Tool,
    Run,
    Io,
    Unknown,
}

/// The single error type shared by every sidekick crate.
///
/// Variants carry strings rather than source errors so the type stays `Clone`,
/// which the retry executors need to keep the last failure around.
#[derive(Error, Debug, Clone)]
pub enum SidekickError {
    /// Transport-level failure (connect, TLS, body read)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// JSON encode/decode failure
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Non-success API response that did not map to a narrower variant
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceededError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    /// A local tool failed while serving a run's tool call
    #[error("Tool '{tool}' failed: {message}")]
    ToolError { tool: String, message: String },

    /// A run reached a failure state
    #[error("Run {status}: {message}")]
    RunFailed { status: String, message: String },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl SidekickError {
    /// Shorthand for an `ApiError` without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Shorthand for a `ToolError`.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// HTTP status implied by this error, when known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            Self::AuthenticationError(_) => Some(401),
            Self::RateLimitError(_) => Some(429),
            Self::NotFound(_) => Some(404),
            Self::InvalidInput(_) => Some(400),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) | Self::TimeoutError(_) => ErrorCategory::Network,
            Self::JsonError(_) => ErrorCategory::Parsing,
            Self::AuthenticationError(_) => ErrorCategory::Authentication,
            Self::RateLimitError(_) => ErrorCategory::RateLimit,
            Self::QuotaExceededError(_) | Self::InvalidInput(_) | Self::NotFound(_) => {
                ErrorCategory::Client
            }
            Self::ApiError { code, .. } => match code {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                400..=499 => ErrorCategory::Client,
                _ => ErrorCategory::Unknown,
            },
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::Io,
            Self::ToolError { .. } => ErrorCategory::Tool,
            Self::RunFailed { .. } => ErrorCategory::Run,
            Self::InternalError(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::RateLimit | ErrorCategory::Server
        )
    }
}
