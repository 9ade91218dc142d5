use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use sidekick_core::config::{Settings, SettingsOverrides};
use sidekick_core::error::SidekickError;
use sidekick_openai::{AssistantsClient, OpenAiConfig};
use sidekick_tools::{ToolRegistry, Workspace};

use super::{RunContext, load_environment};
use crate::session::{SessionManager, SessionOptions, ThreadStore};
use crate::terminal::Console;

#[derive(Args, Debug, Clone, Default)]
pub struct ChatArgs {
    /// Model pushed to the assistant [env: SIDEKICK_MODEL]
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// File holding the persisted thread id [env: SIDEKICK_THREAD_FILE]
    #[arg(long, value_name = "PATH")]
    pub thread_file: Option<PathBuf>,

    /// Directory the file tools are confined to [env: SIDEKICK_WORKSPACE]
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Start with a fresh conversation thread
    #[arg(long)]
    pub reset: bool,

    /// Seconds to wait for a run to finish [env: SIDEKICK_RUN_TIMEOUT]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl ChatArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            model: self.model.clone(),
            thread_file: self.thread_file.clone(),
            workspace: self.workspace.clone(),
            run_timeout: self.timeout.map(Duration::from_secs),
        }
    }

    pub async fn run(&self, ctx: &RunContext) -> Result<(), SidekickError> {
        let env = load_environment(&ctx.env_file)?;
        let settings = Settings::resolve(&env, self.overrides())?;
        tracing::debug!(
            assistant_id = %settings.assistant_id,
            model = %settings.model,
            workspace = %settings.workspace.display(),
            thread_file = %settings.thread_file.display(),
            "Resolved settings"
        );

        let tools = ToolRegistry::with_builtin_tools(Workspace::new(&settings.workspace)?);
        let client = AssistantsClient::new(OpenAiConfig::from_settings(&settings))?;
        let store = ThreadStore::new(&settings.thread_file);
        if self.reset {
            store.clear_thread_id()?;
        }

        let options = SessionOptions::from_settings(&settings).with_verbose(ctx.verbose > 0);
        let console = Console::stdio(ctx.color);
        let mut session = SessionManager::connect(client, options, console, store, tools).await?;
        session.run().await
    }
}
