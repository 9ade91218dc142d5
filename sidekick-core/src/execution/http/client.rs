//! HTTP client builder utilities

use crate::error::SidekickError;
use crate::types::HttpConfig;

/// Build a `reqwest::Client` from `HttpConfig`.
///
/// ```rust,ignore
/// use sidekick_core::types::HttpConfig;
/// use sidekick_core::execution::http::build_http_client_from_config;
///
/// let client = build_http_client_from_config(&HttpConfig::default())?;
/// ```
pub fn build_http_client_from_config(
    config: &HttpConfig,
) -> Result<reqwest::Client, SidekickError> {
    let mut builder = reqwest::Client::builder();

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }

    if let Some(proxy_url) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| SidekickError::ConfigurationError(format!("Invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
    }

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent);
    }

    if !config.headers.is_empty() {
        let headers = super::headers::HttpHeaderBuilder::new()
            .with_custom_headers(&config.headers)?
            .build();
        builder = builder.default_headers(headers);
    }

    builder
        .build()
        .map_err(|e| SidekickError::HttpError(format!("Failed to create HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_http_client_default() {
        assert!(build_http_client_from_config(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_build_http_client_with_timeout() {
        let config = HttpConfig {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        assert!(build_http_client_from_config(&config).is_ok());
    }

    #[test]
    fn test_build_http_client_with_invalid_proxy() {
        let config = HttpConfig {
            proxy: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_http_client_from_config(&config),
            Err(SidekickError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_build_http_client_with_invalid_header_name() {
        let mut config = HttpConfig::default();
        config
            .headers
            .insert("Invalid Header Name".to_string(), "value".to_string());
        assert!(build_http_client_from_config(&config).is_err());
    }
}
