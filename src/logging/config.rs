use crate::logging::layers::console::ConsoleOutput;
use crate::Result;
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::Directive;
use url::Url;

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

/// Directory under the working directory holding logs and logging config.
pub const STATE_DIR: &str = ".twin-migrate";

/// Logging settings after defaults, `logging.toml` and environment have been merged.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
    pub default_level: String,
    pub enable_file: bool,
    pub console_output: Option<ConsoleOutput>,
    pub opentelemetry: OpenTelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct OpenTelemetryConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            default_level: DEFAULT_LEVEL.to_string(),
            enable_file: true,
            console_output: None,
            opentelemetry: OpenTelemetryConfig::default(),
        }
    }
}

impl Default for OpenTelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Precedence: defaults, then `<root>/.twin-migrate/logging.toml`, then environment.
    pub fn load(working_dir: Option<&Path>) -> Result<Self> {
        let mut config = LoggingConfig::default();
        if let Some(root) = working_dir {
            let path = root.join(STATE_DIR).join("logging.toml");
            if let Some(file) = read_logging_file(&path)? {
                config.merge(file);
            }
        }
        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn merge(&mut self, file: LoggingFile) {
        let Some(section) = file.logging else {
            return;
        };
        if let Some(log_dir) = section.log_dir {
            self.log_dir = Some(PathBuf::from(log_dir));
        }
        if let Some(level) = section.default_level {
            self.default_level = level;
        }
        if let Some(enable_file) = section.enable_file {
            self.enable_file = enable_file;
        }
        if section.console_output.is_some() {
            self.console_output = section.console_output;
        }
        if let Some(otel) = section.opentelemetry {
            if let Some(enabled) = otel.enabled {
                self.opentelemetry.enabled = enabled;
            }
            if let Some(endpoint) = otel.endpoint {
                self.opentelemetry.endpoint = Some(endpoint);
            }
            if let Some(service_name) = otel.service_name {
                self.opentelemetry.service_name = service_name;
            }
        }
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.opentelemetry.endpoint = Some(endpoint);
                self.opentelemetry.enabled = true;
            }
        }
        if let Some(dir) = lookup("TWIN_MIGRATE_LOG_DIR") {
            if !dir.trim().is_empty() {
                self.log_dir = Some(PathBuf::from(dir));
            }
        }
    }

    fn validate(&self) -> Result<()> {
        Directive::from_str(&self.default_level)
            .map_err(|_| anyhow!("logging.default_level must be a valid tracing directive"))?;

        match (&self.opentelemetry.endpoint, self.opentelemetry.enabled) {
            (Some(endpoint), _) => {
                Url::parse(endpoint)
                    .map_err(|err| anyhow!("invalid logging.opentelemetry.endpoint: {}", err))?;
            }
            (None, true) => {
                return Err(anyhow!(
                    "logging.opentelemetry.endpoint is required when opentelemetry is enabled"
                ));
            }
            (None, false) => {}
        }

        if self.opentelemetry.enabled && self.opentelemetry.service_name.trim().is_empty() {
            return Err(anyhow!(
                "logging.opentelemetry.service_name must be set when opentelemetry is enabled"
            ));
        }
        Ok(())
    }
}

fn read_logging_file(path: &Path) -> Result<Option<LoggingFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read logging config {}", path.display()))?;
    let parsed = toml::from_str(&content)
        .with_context(|| format!("failed to parse logging config {}", path.display()))?;
    Ok(Some(parsed))
}

#[derive(Debug, Deserialize)]
struct LoggingFile {
    logging: Option<LoggingSection>,
}

#[derive(Debug, Deserialize)]
struct LoggingSection {
    log_dir: Option<String>,
    default_level: Option<String>,
    enable_file: Option<bool>,
    #[serde(default)]
    console_output: Option<ConsoleOutput>,
    opentelemetry: Option<OpenTelemetrySection>,
}

#[derive(Debug, Deserialize)]
struct OpenTelemetrySection {
    enabled: Option<bool>,
    endpoint: Option<String>,
    service_name: Option<String>,
}
