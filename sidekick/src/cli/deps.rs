use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use sidekick_core::error::SidekickError;

use super::RunContext;
use crate::manifest::Manifest;

#[derive(Args, Debug, Clone)]
pub struct DepsArgs {
    /// Manifest file (`name>=X.Y.Z  # purpose` per line)
    #[arg(value_name = "FILE", default_value = "requirements.txt")]
    pub file: PathBuf,
}

impl DepsArgs {
    pub fn run(&self, ctx: &RunContext) -> Result<(), SidekickError> {
        let manifest = Manifest::load(&self.file)?;
        if manifest.is_empty() {
            println!("No packages declared in {}", self.file.display());
            return Ok(());
        }

        let table = manifest.render_table();
        let mut lines = table.lines();
        if let Some(header) = lines.next() {
            if ctx.color {
                println!("{}", header.bold());
            } else {
                println!("{header}");
            }
        }
        for line in lines {
            println!("{line}");
        }
        println!(
            "\n{} package(s) declared in {}",
            manifest.len(),
            self.file.display()
        );
        Ok(())
    }
}
