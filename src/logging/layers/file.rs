use crate::logging::config::{LoggingConfig, STATE_DIR};
use crate::logging::layers::BoxLayer;
use crate::Result;
use anyhow::{anyhow, Context};
use std::fs::{create_dir_all, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::registry::LookupSpan;

const LOG_FILE_NAME: &str = "twin-migrate.log";

/// Resolve `<log_dir>/twin-migrate.log`, defaulting to `<working dir>/.twin-migrate/logs`.
pub fn log_file_path(config: &LoggingConfig, working_dir: Option<&Path>) -> Result<PathBuf> {
    let base = match (&config.log_dir, working_dir) {
        (Some(custom), _) if custom.is_absolute() => custom.clone(),
        (Some(custom), Some(root)) => root.join(custom),
        (Some(custom), None) => home_base()?.join(custom),
        (None, Some(root)) => root.join(STATE_DIR).join("logs"),
        (None, None) => home_base()?.join(STATE_DIR).join("logs"),
    };
    Ok(base.join(LOG_FILE_NAME))
}

/// Append-mode file layer behind a non-blocking writer. Returns `None` when disabled.
pub fn file_layer<S>(log_file: &Path, enabled: bool) -> Result<Option<(BoxLayer<S>, WorkerGuard)>>
where
    S: Subscriber + for<'a> LookupSpan<'a> + Send + Sync + 'static,
{
    if !enabled {
        return Ok(None);
    }

    let directory = log_file.parent().ok_or_else(|| {
        anyhow!(
            "log file path {} has no parent directory",
            log_file.display()
        )
    })?;
    create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {}", directory.display()))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(BoxMakeWriter::new(non_blocking))
        .with_ansi(false)
        .with_thread_ids(false)
        .with_thread_names(false);
    Ok(Some((Box::new(layer), guard)))
}

fn home_base() -> Result<PathBuf> {
    dirs_next::home_dir().ok_or_else(|| anyhow!("$HOME directory unavailable"))
}
