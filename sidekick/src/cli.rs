//! Defines the command-line argument structure using clap.
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use sidekick_core::config::{EnvLayers, load_dotenv_file};
use sidekick_core::error::SidekickError;

pub mod chat;
pub mod deps;
pub mod tools;

pub use chat::ChatArgs;
pub use deps::DepsArgs;
pub use tools::ToolsArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "sidekick", bin_name = "sidekick")]
#[command(propagate_version = true, args_conflicts_with_subcommands = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output (also honored via NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Dotenv file whose values override the process environment
    #[arg(long, global = true, value_name = "PATH", default_value = ".env")]
    pub env_file: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for the default `chat` command
    #[command(flatten)]
    pub chat: ChatArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive chat (default)
    Chat(ChatArgs),
    /// Show the packages declared in a dependency manifest
    Deps(DepsArgs),
    /// List the tools that are pushed to the assistant
    Tools(ToolsArgs),
}

/// Options shared by every command
#[derive(Debug, Clone)]
pub struct RunContext {
    pub env_file: PathBuf,
    pub color: bool,
    pub verbose: u8,
}

impl CliArgs {
    pub fn context(&self, color: bool) -> RunContext {
        RunContext {
            env_file: self.env_file.clone(),
            color,
            verbose: self.verbose,
        }
    }

    pub async fn run(&self, ctx: &RunContext) -> Result<(), SidekickError> {
        match &self.command {
            None => self.chat.run(ctx).await,
            Some(Command::Chat(command)) => command.run(ctx).await,
            Some(Command::Deps(command)) => command.run(ctx),
            Some(Command::Tools(command)) => command.run(ctx),
        }
    }
}

/// Process environment overlaid with the dotenv file, if it exists.
pub fn load_environment(env_file: &Path) -> Result<EnvLayers, SidekickError> {
    let entries = load_dotenv_file(env_file)?;
    tracing::debug!(
        path = %env_file.display(),
        entries = entries.len(),
        "Loaded dotenv file"
    );
    Ok(EnvLayers::from_process().with_dotenv(entries))
}
