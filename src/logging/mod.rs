pub mod config;
pub mod context;
pub mod layers;

pub use context::{detect_context, ExecutionContext};
pub use layers::console::ConsoleOutput;

use crate::cli::Command;
use crate::logging::config::LoggingConfig;
use crate::logging::layers::{console, file, opentelemetry, BoxLayer};
use crate::Result;
use anyhow::{anyhow, Context};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Keeps logging sinks alive for the duration of the command.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    _otel_guard: Option<opentelemetry::OpenTelemetryGuard>,
    console_output: ConsoleOutput,
    log_file_path: Option<PathBuf>,
}

impl LoggingGuard {
    pub fn console_output(&self) -> ConsoleOutput {
        self.console_output
    }

    /// Path of the file sink, if it is enabled.
    pub fn log_file_path(&self) -> Option<&Path> {
        self.log_file_path.as_deref()
    }
}

/// Initialize logging for the provided CLI command.
///
/// Composes the env filter (`RUST_LOG` or `logging.default_level`), the file sink, the
/// console sink chosen from the execution context, and the optional OTLP exporter. Fails
/// when called twice in one process.
pub fn init(command: &Command) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let context = detect_context(command);
    let working_dir = env::current_dir().ok();
    let config = LoggingConfig::load(working_dir.as_deref())?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("failed to configure tracing level")?;

    let mut layers: Vec<BoxLayer<Registry>> = Vec::new();

    let log_file_path = file::log_file_path(&config, working_dir.as_deref())?;
    let file_guard = match file::file_layer::<Registry>(&log_file_path, config.enable_file)? {
        Some((layer, guard)) => {
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    let console_output = console::select_console_output(context, config.console_output);
    layers.push(console::console_layer::<Registry>(console_output));

    let mut otel_warning = None;
    let otel_guard = if config.opentelemetry.enabled {
        match opentelemetry::build_layer::<Registry>(&config.opentelemetry) {
            Ok((layer, guard)) => {
                layers.push(layer);
                Some(guard)
            }
            Err(err) => {
                otel_warning = Some(err.to_string());
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(warning) = otel_warning {
        tracing::warn!("OpenTelemetry disabled: {}", warning);
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
        _otel_guard: otel_guard,
        console_output,
        log_file_path: config.enable_file.then_some(log_file_path),
    })
}
