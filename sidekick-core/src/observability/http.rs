//! HTTP request tracing with masked credentials.

use std::time::Instant;

use reqwest::header::HeaderMap;
use tracing::{debug, error, info};

/// Mask a secret-looking value, keeping a short prefix and suffix.
pub fn mask_sensitive_value(value: &str) -> String {
    if let Some(token) = value.strip_prefix("Bearer ")
        && token.len() > 8
    {
        return format!("Bearer {}...{}", &token[..4], &token[token.len() - 4..]);
    }
    if value.starts_with("sk-") && value.len() > 12 {
        return format!("{}...{}", &value[..8], &value[value.len() - 4..]);
    }
    if value.len() > 16 {
        format!("{}...{}", &value[..6], &value[value.len() - 4..])
    } else {
        "***".to_string()
    }
}

fn is_sensitive_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("authorization") || lower.contains("key") || lower.contains("token")
}

/// Render headers as compact JSON, masking credentials.
pub fn format_headers_for_logging(headers: &HeaderMap) -> String {
    let map: std::collections::BTreeMap<&str, String> = headers
        .iter()
        .map(|(k, v)| {
            let value = v.to_str().unwrap_or("<invalid>");
            let shown = if is_sensitive_header(k.as_str()) {
                mask_sensitive_value(value)
            } else {
                value.to_string()
            };
            (k.as_str(), shown)
        })
        .collect();
    serde_json::to_string(&map).unwrap_or_else(|_| format!("{map:?}"))
}

/// Emits structured events around one API request.
pub struct ApiTracer {
    api: String,
    operation: &'static str,
}

impl ApiTracer {
    pub fn new(api: impl Into<String>, operation: &'static str) -> Self {
        Self {
            api: api.into(),
            operation,
        }
    }

    pub fn trace_request_start(&self, method: &str, url: &str) {
        info!(api = %self.api, operation = self.operation, method = %method, url = %url, "Request started");
    }

    pub fn trace_request_details(&self, headers: &HeaderMap, body: Option<&serde_json::Value>) {
        debug!(
            api = %self.api,
            operation = self.operation,
            request_headers = %format_headers_for_logging(headers),
            request_body = %body.map(|b| b.to_string()).unwrap_or_default(),
            "Request details"
        );
    }

    pub fn trace_response_body(&self, body: &str) {
        debug!(api = %self.api, operation = self.operation, response_body = %body, "Response body");
    }

    pub fn trace_request_complete(&self, start: Instant, status_code: u16) {
        info!(
            api = %self.api,
            operation = self.operation,
            status_code = status_code,
            duration = %super::format_duration(start.elapsed()),
            "Request completed"
        );
    }

    pub fn trace_request_error(&self, status_code: u16, error_text: &str, start: Instant) {
        error!(
            api = %self.api,
            operation = self.operation,
            status_code = status_code,
            error_text = %error_text,
            duration = %super::format_duration(start.elapsed()),
            "Request failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn masks_bearer_tokens() {
        assert_eq!(
            mask_sensitive_value("Bearer sk-abcdefghijklmnop"),
            "Bearer sk-a...mnop"
        );
    }

    #[test]
    fn masks_short_secrets_entirely() {
        assert_eq!(mask_sensitive_value("short"), "***");
    }

    #[test]
    fn header_formatting_masks_authorization_only() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer sk-proj-1234567890abcdef"),
        );
        headers.insert("openai-beta", HeaderValue::from_static("assistants=v2"));
        let rendered = format_headers_for_logging(&headers);
        assert!(!rendered.contains("1234567890"));
        assert!(rendered.contains("assistants=v2"));
    }
}
