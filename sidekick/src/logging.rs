//! Tracing subscriber setup.
//!
//! Logs go to stderr filtered by `SIDEKICK_LOG` (default `warn`). With `-v` they are
//! also written to a daily file under the user data directory.

use std::path::PathBuf;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt};

pub const LOG_ENV_VAR: &str = "SIDEKICK_LOG";
pub const LOG_FILE_PREFIX: &str = "sidekick.log";

pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// `<data dir>/sidekick/logs`
pub fn log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("sidekick").join("logs"))
}

/// Plain-text layer for the log file; escape codes never reach it.
pub fn file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer().with_writer(writer).with_ansi(false)
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered file logs are flushed.
pub fn init_logging(verbose: u8, ansi: bool) -> Option<WorkerGuard> {
    let level_filter = level_for_verbosity(verbose);
    let max_log_level = level_filter.into_level().unwrap_or(tracing::Level::WARN);

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let file_dir = if verbose > 0 { log_dir() } else { None };
    let Some(dir) = file_dir else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .without_time()
            .try_init();
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(&dir) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .without_time()
            .try_init();
        tracing::warn!("Failed to create log directory {}: {e}", dir.display());
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr.with_max_level(max_log_level))
        .with_ansi(ansi)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer(non_blocking_appender.with_max_level(max_log_level)))
        .try_init();

    tracing::debug!(
        "Verbose logging enabled. Writing logs to: {}/{LOG_FILE_PREFIX}",
        dir.display()
    );
    Some(guard)
}
