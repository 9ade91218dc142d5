//! OpenAI client configuration

use secrecy::SecretString;
use sidekick_core::config::Settings;
use sidekick_core::types::HttpConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Value of the `OpenAI-Beta` header selecting the Assistants v2 surface
pub const ASSISTANTS_BETA_HEADER: &str = "assistants=v2";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    /// Base URL without trailing slash, including the `/v1` prefix
    pub base_url: String,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub http_config: HttpConfig,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            organization: None,
            project: None,
            http_config: HttpConfig::default(),
        }
    }

    /// Build from resolved session settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            organization: settings.organization.clone(),
            project: settings.project.clone(),
            http_config: HttpConfig::default().with_timeout(settings.http_timeout),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = http_config;
        self
    }
}
