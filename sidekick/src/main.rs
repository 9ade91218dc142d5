// sidekick/src/main.rs
use std::process;

use clap::Parser;
use colored::Colorize;
use sidekick::Console;
use sidekick::cli::CliArgs;
use sidekick::logging::init_logging;
use sidekick_core::error::helpers::{format_summary, summarize_error};
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    let cli_args = CliArgs::parse();

    let color = !cli_args.no_color && std::env::var_os("NO_COLOR").is_none();
    if !color {
        colored::control::set_override(false);
    }
    let guard = init_logging(cli_args.verbose, color);
    let ctx = cli_args.context(color);

    let result = tokio::select! {
        result = cli_args.run(&ctx) => result,
        _ = tokio::signal::ctrl_c() => {
            Console::stdio(color).print_system_message("\nGoodbye!");
            drop(guard);
            process::exit(0);
        }
    };

    if let Err(e) = result {
        error!("Command failed: {e}");
        eprintln!("{} {e}", "Fatal error:".red().bold());
        if cli_args.verbose > 0 {
            eprint!("{}", format_summary(&summarize_error(&e), true));
        }
        drop(guard);
        process::exit(1);
    }

    debug!("Command completed successfully.");
}
