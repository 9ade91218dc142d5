//! Type Conversions for SidekickError

use super::types::SidekickError;

impl From<reqwest::Error> for SidekickError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SidekickError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for SidekickError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
