//! Resolved chat-session settings.
//!
//! Precedence: command-line override > `.env` > process environment > default.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::env::EnvLayers;
use crate::error::SidekickError;
use crate::types::ToolDefinition;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
/// Lowest accepted `SIDEKICK_POLL_INTERVAL_MS`
pub const MIN_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_ASSISTANT_ID: &str = "ASSISTANT_ID";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_ORG_ID: &str = "OPENAI_ORG_ID";
pub const ENV_PROJECT_ID: &str = "OPENAI_PROJECT_ID";
pub const ENV_MODEL: &str = "SIDEKICK_MODEL";
pub const ENV_THREAD_FILE: &str = "SIDEKICK_THREAD_FILE";
pub const ENV_WORKSPACE: &str = "SIDEKICK_WORKSPACE";
pub const ENV_HOSTED_TOOLS: &str = "SIDEKICK_HOSTED_TOOLS";
pub const ENV_RUN_TIMEOUT: &str = "SIDEKICK_RUN_TIMEOUT";
pub const ENV_POLL_INTERVAL_MS: &str = "SIDEKICK_POLL_INTERVAL_MS";
pub const ENV_HTTP_TIMEOUT: &str = "SIDEKICK_HTTP_TIMEOUT";

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub model: Option<String>,
    pub thread_file: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub run_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: SecretString,
    pub assistant_id: String,
    pub base_url: String,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub model: String,
    /// File holding the persisted thread id
    pub thread_file: PathBuf,
    /// Root directory the file tools are confined to
    pub workspace: PathBuf,
    /// Server-side tools to enable alongside the local function tools
    pub hosted_tools: Vec<ToolDefinition>,
    pub run_timeout: Duration,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
}

impl Settings {
    /// Resolve settings from the layered environment and command-line overrides.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` when `OPENAI_API_KEY` or `ASSISTANT_ID` is missing, a
    /// numeric value does not parse, or a hosted tool name is unknown.
    pub fn resolve(env: &EnvLayers, overrides: SettingsOverrides) -> Result<Self, SidekickError> {
        let api_key = SecretString::from(env.require(ENV_API_KEY)?);
        let assistant_id = env.require(ENV_ASSISTANT_ID)?;

        let base_url = env
            .get(ENV_BASE_URL)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = overrides
            .model
            .or_else(|| env.get(ENV_MODEL))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let thread_file = overrides
            .thread_file
            .or_else(|| env.get(ENV_THREAD_FILE).map(PathBuf::from))
            .unwrap_or_else(default_thread_file);

        let workspace = overrides
            .workspace
            .or_else(|| env.get(ENV_WORKSPACE).map(PathBuf::from))
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let hosted_tools = match env.get(ENV_HOSTED_TOOLS) {
            Some(raw) => parse_hosted_tools(&raw)?,
            None => Vec::new(),
        };

        let run_timeout = match overrides.run_timeout {
            Some(t) => t,
            None => env
                .parse::<u64>(ENV_RUN_TIMEOUT)?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RUN_TIMEOUT),
        };

        let poll_interval = match env.parse::<u64>(ENV_POLL_INTERVAL_MS)? {
            Some(ms) if ms < MIN_POLL_INTERVAL_MS => {
                return Err(SidekickError::ConfigurationError(format!(
                    "Invalid value for {ENV_POLL_INTERVAL_MS} ('{ms}'): must be at least {MIN_POLL_INTERVAL_MS}"
                )));
            }
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_POLL_INTERVAL,
        };

        let http_timeout = env
            .parse::<u64>(ENV_HTTP_TIMEOUT)?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);

        Ok(Self {
            api_key,
            assistant_id,
            base_url,
            organization: env.get(ENV_ORG_ID),
            project: env.get(ENV_PROJECT_ID),
            model,
            thread_file,
            workspace,
            hosted_tools,
            run_timeout,
            poll_interval,
            http_timeout,
        })
    }
}

/// `<config dir>/sidekick/thread_id`, or a dotfile in the working directory.
pub fn default_thread_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("sidekick").join("thread_id"))
        .unwrap_or_else(|| PathBuf::from(".sidekick_thread_id"))
}

/// Parse a comma-separated list of hosted tool names.
pub fn parse_hosted_tools(raw: &str) -> Result<Vec<ToolDefinition>, SidekickError> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            ToolDefinition::hosted(name).ok_or_else(|| {
                SidekickError::ConfigurationError(format!(
                    "Unknown hosted tool '{name}' in {ENV_HOSTED_TOOLS} (expected code_interpreter or file_search)"
                ))
            })
        })
        .collect()
}
