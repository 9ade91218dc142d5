use reqwest::header::HeaderMap;
use serde_json::Value;
use sidekick_core::error::SidekickError;
use sidekick_core::retry_api::classify_http_error;

/// Classify a failed OpenAI response: error envelope first, then status heuristics.
pub fn classify_openai_error(status: u16, body_text: &str, headers: &HeaderMap) -> SidekickError {
    // 5xx keeps its status so it stays retryable even when the envelope looks typed.
    if (500..=599).contains(&status) {
        let message = envelope_message(body_text);
        return classify_http_error("openai", status, body_text, headers, message.as_deref());
    }
    classify_openai_compatible_http_error("openai", status, body_text)
        .unwrap_or_else(|| classify_http_error("openai", status, body_text, headers, None))
}

/// Classify OpenAI-style HTTP errors by parsing the standard error envelope.
///
/// OpenAI returns `{ "error": { "message": "...", "type": "...", "code": "..." } }`.
/// Returns `None` when the body doesn't match the envelope.
pub fn classify_openai_compatible_http_error(
    provider: &str,
    status: u16,
    body_text: &str,
) -> Option<SidekickError> {
    let json: Value = serde_json::from_str(body_text).ok()?;
    let error_obj = json.get("error")?;

    let message = error_obj
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown error");
    let error_type = error_obj.get("type").and_then(|v| v.as_str());
    let error_code = error_obj.get("code").and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    if error_code.as_deref() == Some("insufficient_quota") {
        return Some(SidekickError::QuotaExceededError(message.to_string()));
    }

    let mapped = match error_type.unwrap_or("") {
        "authentication_error" => SidekickError::AuthenticationError(message.to_string()),
        "rate_limit_error" | "rate_limit_exceeded" => {
            SidekickError::RateLimitError(message.to_string())
        }
        "insufficient_quota" => SidekickError::QuotaExceededError(message.to_string()),
        "invalid_request_error" => match status {
            401 => SidekickError::AuthenticationError(message.to_string()),
            404 => SidekickError::NotFound(message.to_string()),
            429 => SidekickError::RateLimitError(message.to_string()),
            _ => SidekickError::InvalidInput(message.to_string()),
        },
        "not_found_error" => SidekickError::NotFound(message.to_string()),
        "" => map_openai_message_heuristics(provider, status, message, json.clone()),
        other => SidekickError::ApiError {
            code: status,
            message: format!("{provider} API error ({other}): {message}"),
            details: Some(json.clone()),
        },
    };

    Some(mapped)
}

fn envelope_message(body_text: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body_text).ok()?;
    json.get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn map_openai_message_heuristics(
    provider: &str,
    status: u16,
    message: &str,
    details: Value,
) -> SidekickError {
    let lower = message.to_lowercase();

    if status == 401 || lower.contains("api key") || lower.contains("unauthorized") {
        return SidekickError::AuthenticationError(message.to_string());
    }
    if status == 429 || lower.contains("rate limit") {
        return SidekickError::RateLimitError(message.to_string());
    }
    if lower.contains("quota") {
        return SidekickError::QuotaExceededError(message.to_string());
    }
    if status == 404 {
        return SidekickError::NotFound(message.to_string());
    }
    if status == 400 {
        return SidekickError::InvalidInput(message.to_string());
    }

    SidekickError::ApiError {
        code: status,
        message: format!("{provider} API error: {message}"),
        details: Some(details),
    }
}
