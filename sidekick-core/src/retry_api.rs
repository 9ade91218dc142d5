//! Public Retry API Facade
//!
//! - Simple default: `retry` uses the backoff-based executor
//! - Opt-in control: `RetryOptions` selects the backend and whether the call is idempotent
//! - `classify_http_error` turns a failed HTTP exchange into a typed error with retry hints
//!
//! ```rust,ignore
//! use sidekick_core::retry_api::{retry_with, RetryOptions};
//!
//! let options = RetryOptions::policy_default().with_max_attempts(5);
//! let result = retry_with(|| do_work(), options).await?;
//! ```

use crate::error::SidekickError;
use reqwest::header::HeaderMap;

pub use crate::retry::{BackoffRetryExecutor, RetryExecutor, RetryPolicy};

/// Retry backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryBackend {
    /// Backoff crate-based executor (recommended default)
    #[default]
    Backoff,
    /// Simple policy-based executor
    Policy,
}

/// Unified retry options
#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub backend: RetryBackend,
    /// Optional backoff executor override (Backoff backend only)
    pub backoff_executor: Option<BackoffRetryExecutor>,
    /// Policy-based options (Policy backend only)
    pub policy: Option<RetryPolicy>,
    /// Whether the request is idempotent.
    ///
    /// Non-idempotent requests (creating messages, runs, submitting tool outputs) are
    /// only retried on rate limiting, where the server rejected the request outright.
    pub idempotent: bool,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            backend: RetryBackend::Backoff,
            backoff_executor: None,
            policy: None,
            idempotent: true,
        }
    }
}

impl RetryOptions {
    /// Use default backoff backend
    pub fn backoff() -> Self {
        Self::default()
    }

    /// Use backoff backend with a custom executor.
    pub fn with_backoff_executor(mut self, executor: BackoffRetryExecutor) -> Self {
        self.backend = RetryBackend::Backoff;
        self.backoff_executor = Some(executor);
        self
    }

    /// Use policy-based backend with default policy
    pub fn policy_default() -> Self {
        Self {
            backend: RetryBackend::Policy,
            policy: Some(RetryPolicy::default()),
            ..Default::default()
        }
    }

    /// Use policy-based backend with an explicit policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.backend = RetryBackend::Policy;
        self.policy = Some(policy);
        self
    }

    /// Set max attempts for policy backend
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        if let Some(policy) = self.policy.take() {
            self.policy = Some(policy.with_max_attempts(attempts));
        }
        self
    }

    /// Set whether the request is idempotent
    pub fn with_idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }
}

fn is_rate_limited(err: &SidekickError) -> bool {
    matches!(err, SidekickError::RateLimitError(_)) || err.status_code() == Some(429)
}

/// Recommended default retry (backoff-based)
pub async fn retry<F, Fut, T>(operation: F) -> Result<T, SidekickError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, SidekickError>>,
{
    crate::retry::retry_with_backoff(operation).await
}

/// Retry with explicit options (backend selection)
pub async fn retry_with<F, Fut, T>(operation: F, options: RetryOptions) -> Result<T, SidekickError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, SidekickError>>,
{
    match options.backend {
        RetryBackend::Backoff => {
            let mut executor = options.backoff_executor.unwrap_or_default();
            if !options.idempotent {
                executor = executor.with_retry_condition(is_rate_limited);
            }
            executor.execute(operation).await
        }
        RetryBackend::Policy => {
            let mut policy = options.policy.unwrap_or_default();
            if !options.idempotent {
                policy = policy.with_retry_condition(is_rate_limited);
            }
            RetryExecutor::new(policy).execute(operation).await
        }
    }
}

/// Retry only when options are provided.
pub async fn maybe_retry<F, Fut, T>(
    options: Option<RetryOptions>,
    operation: F,
) -> Result<T, SidekickError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, SidekickError>>,
{
    match options {
        Some(opts) => retry_with(operation, opts).await,
        None => operation().await,
    }
}

/// Classify an HTTP failure into a more specific error type with retry hints.
///
/// Inspects the status code, response body and headers. Request identifiers are
/// appended to messages when the server sent them.
pub fn classify_http_error(
    provider_id: &str,
    status: u16,
    body_text: &str,
    headers: &HeaderMap,
    fallback_message: Option<&str>,
) -> SidekickError {
    let lower = body_text.to_lowercase();

    fn header_val(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }
    let id_keys = ["x-request-id", "openai-request-id", "x-trace-id"];
    let request_ids: Vec<String> = id_keys
        .iter()
        .filter_map(|k| header_val(headers, k).map(|v| format!("{k}={v}")))
        .collect();
    let ids_suffix = if request_ids.is_empty() {
        String::new()
    } else {
        format!(" ids=[{}]", request_ids.join(","))
    };
    let body_sample = body_text.chars().take(200).collect::<String>();

    if status == 429 {
        if lower.contains("insufficient_quota") || lower.contains("exceeded your current quota") {
            return SidekickError::QuotaExceededError(format!(
                "provider={provider_id} quota exceeded{ids_suffix}"
            ));
        }
        let retry_after = header_val(headers, "retry-after").unwrap_or_default();
        return SidekickError::RateLimitError(format!(
            "provider={provider_id} http=429 retry_after={retry_after}{ids_suffix} body_sample={body_sample}"
        ));
    }

    if status == 401 {
        return SidekickError::AuthenticationError(format!(
            "provider={provider_id} unauthorized{ids_suffix} body_sample={body_sample}"
        ));
    }

    if status == 404 {
        return SidekickError::NotFound(format!(
            "provider={provider_id} http=404{ids_suffix} body_sample={body_sample}"
        ));
    }

    if status == 403 || status == 400 {
        if lower.contains("quota") {
            return SidekickError::QuotaExceededError(format!(
                "provider={provider_id} quota exceeded{ids_suffix}"
            ));
        }
        if lower.contains("rate limit") || lower.contains("rate_limit_exceeded") {
            return SidekickError::RateLimitError(format!(
                "provider={provider_id} rate limited{ids_suffix}"
            ));
        }
        if status == 403 {
            return SidekickError::AuthenticationError(format!(
                "provider={provider_id} forbidden{ids_suffix} body_sample={body_sample}"
            ));
        }
        return SidekickError::InvalidInput(format!(
            "provider={provider_id} bad request{ids_suffix} body_sample={body_sample}"
        ));
    }

    if (500..=599).contains(&status) {
        return SidekickError::api_error(status, fallback_message.unwrap_or("server error"));
    }

    let message = match fallback_message {
        Some(fallback) => fallback.to_string(),
        None if body_text.trim().is_empty() => "api error".to_string(),
        None => body_sample,
    };
    let details = match serde_json::from_str::<serde_json::Value>(body_text) {
        Ok(json) => serde_json::json!({
            "status": status,
            "provider": provider_id,
            "response": json,
            "request_ids": request_ids,
        }),
        Err(_) => serde_json::json!({
            "status": status,
            "provider": provider_id,
            "raw": body_text,
            "request_ids": request_ids,
        }),
    };
    SidekickError::ApiError {
        code: status,
        message,
        details: Some(details),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false)
    }

    #[tokio::test]
    async fn retry_with_policy_backend_works() {
        let opts = RetryOptions::default()
            .with_policy(fast_policy())
            .with_max_attempts(2);
        let attempts = Arc::new(AtomicU32::new(0));
        let res: Result<(), SidekickError> = retry_with(
            || {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::Relaxed) < 1 {
                        Err(SidekickError::api_error(500, "server"))
                    } else {
                        Ok(())
                    }
                }
            },
            opts,
        )
        .await;
        assert!(res.is_ok());
        assert_eq!(attempts.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn non_idempotent_requests_skip_server_error_retries() {
        let opts = RetryOptions::default()
            .with_policy(fast_policy())
            .with_idempotent(false);
        let attempts = Arc::new(AtomicU32::new(0));
        let res: Result<(), SidekickError> = retry_with(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::Relaxed);
                    Err(SidekickError::api_error(502, "bad gateway"))
                }
            },
            opts,
        )
        .await;
        assert!(res.is_err());
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn non_idempotent_requests_still_retry_rate_limits() {
        let opts = RetryOptions::default()
            .with_policy(fast_policy().with_max_attempts(3))
            .with_idempotent(false);
        let attempts = Arc::new(AtomicU32::new(0));
        let res = retry_with(
            || {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::Relaxed) == 0 {
                        Err(SidekickError::RateLimitError("429".into()))
                    } else {
                        Ok("created")
                    }
                }
            },
            opts,
        )
        .await;
        assert_eq!(res.unwrap(), "created");
        assert_eq!(attempts.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn maybe_retry_without_options_calls_once() {
        let attempts = Arc::new(AtomicU32::new(0));
        let res: Result<(), SidekickError> = maybe_retry(None, || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::Relaxed);
                Err(SidekickError::api_error(500, "server"))
            }
        })
        .await;
        assert!(res.is_err());
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn classify_http_error_uses_fallback_message_for_non_json_body() {
        let headers = HeaderMap::new();
        let err = classify_http_error(
            "openai",
            502,
            "<html>bad gateway</html>",
            &headers,
            Some("Bad Gateway"),
        );
        match err {
            SidekickError::ApiError { code, message, .. } => {
                assert_eq!(code, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn classify_http_error_rate_limit_carries_retry_after_and_ids() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("7"));
        headers.insert("x-request-id", HeaderValue::from_static("req_123"));
        let err = classify_http_error("openai", 429, "{}", &headers, None);
        match err {
            SidekickError::RateLimitError(msg) => {
                assert!(msg.contains("retry_after=7"));
                assert!(msg.contains("x-request-id=req_123"));
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn classify_http_error_quota_on_429() {
        let err = classify_http_error(
            "openai",
            429,
            r#"{"error":{"code":"insufficient_quota"}}"#,
            &HeaderMap::new(),
            None,
        );
        assert!(matches!(err, SidekickError::QuotaExceededError(_)));
    }

    #[test]
    fn classify_http_error_maps_common_statuses() {
        let h = HeaderMap::new();
        assert!(matches!(
            classify_http_error("openai", 401, "", &h, None),
            SidekickError::AuthenticationError(_)
        ));
        assert!(matches!(
            classify_http_error("openai", 404, "", &h, None),
            SidekickError::NotFound(_)
        ));
        assert!(matches!(
            classify_http_error("openai", 400, "missing field", &h, None),
            SidekickError::InvalidInput(_)
        ));
        assert!(matches!(
            classify_http_error("openai", 409, r#"{"a":1}"#, &h, None),
            SidekickError::ApiError { code: 409, details: Some(_), .. }
        ));
    }
}
