use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use sidekick_core::config::settings::{ENV_HOSTED_TOOLS, ENV_WORKSPACE, parse_hosted_tools};
use sidekick_core::error::SidekickError;
use sidekick_core::types::ToolDefinition;
use sidekick_tools::{ToolRegistry, Workspace};

use super::{RunContext, load_environment};

#[derive(Args, Debug, Clone, Default)]
pub struct ToolsArgs {
    /// Directory the file tools are confined to [env: SIDEKICK_WORKSPACE]
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Print the definitions as JSON, exactly as sent to the assistant
    #[arg(long)]
    pub json: bool,
}

impl ToolsArgs {
    pub fn definitions(&self, ctx: &RunContext) -> Result<Vec<ToolDefinition>, SidekickError> {
        let env = load_environment(&ctx.env_file)?;
        let root = match self
            .workspace
            .clone()
            .or_else(|| env.get(ENV_WORKSPACE).map(PathBuf::from))
        {
            Some(root) => root,
            None => std::env::current_dir()?,
        };
        let hosted = match env.get(ENV_HOSTED_TOOLS) {
            Some(raw) => parse_hosted_tools(&raw)?,
            None => Vec::new(),
        };
        Ok(ToolRegistry::with_builtin_tools(Workspace::new(root)?).definitions(&hosted))
    }

    pub fn run(&self, ctx: &RunContext) -> Result<(), SidekickError> {
        let definitions = self.definitions(ctx)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&definitions)?);
            return Ok(());
        }

        for definition in &definitions {
            let name = format!("{:<20}", definition.name());
            let name = if ctx.color {
                name.bold().to_string()
            } else {
                name
            };
            match definition {
                ToolDefinition::Function { function } => {
                    println!("{name} {}", function.description)
                }
                _ => println!("{name} (hosted)"),
            }
        }
        Ok(())
    }
}
