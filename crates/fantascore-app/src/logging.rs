// Tracing setup. Logs go to a file so stdout stays clean for command output.

use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::config::LoggingConfig;

const LOG_FILE_NAME: &str = "fantascore.log";

/// Install the global subscriber, appending to `<dir>/fantascore.log`.
///
/// `RUST_LOG` takes precedence over the configured filter. Returns the log
/// file path.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = Path::new(&config.dir);
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join(LOG_FILE_NAME);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(log_path)
}
