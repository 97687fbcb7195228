#![allow(clippy::result_large_err)]

use super::MigrateConfig;
use crate::core::error::AppError;
use crate::core::types::{ErrorCategory, PatchFailurePolicy};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "twin-migrate.toml";

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub patch_failure_policy: Option<PatchFailurePolicy>,
    pub max_runtime: Option<Duration>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from the working directory (dir/twin-migrate.toml).
    /// Environment variables override config file values.
    /// A missing file is not an error (defaults + env vars are used).
    pub fn load_from_workspace(workspace_path: &Path) -> Result<MigrateConfig, AppError> {
        let config_path = workspace_path.join(CONFIG_FILE_NAME);
        let mut config = Self::load_from_file(&config_path)?.unwrap_or_default();
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Load config from an explicit path, which must exist, then apply env overrides.
    pub fn load_explicit(path: &Path) -> Result<MigrateConfig, AppError> {
        let mut config = Self::load_from_file(path)?.ok_or_else(|| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("config file {} does not exist", path.display()),
            )
        })?;
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<MigrateConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: MigrateConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
        })?;

        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    /// Environment variables take precedence over config file values
    pub fn apply_env_overrides(config: &mut MigrateConfig) -> Result<(), AppError> {
        if let Ok(endpoint) = env::var("TWIN_MIGRATE_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                config.service.endpoint = Some(endpoint);
            }
        }

        if let Ok(api_version) = env::var("TWIN_MIGRATE_API_VERSION") {
            config.service.api_version = api_version;
        }

        if let Ok(token_env) = env::var("TWIN_MIGRATE_TOKEN_ENV") {
            config.service.token_env = token_env;
        }

        if let Ok(page_size) = env::var("TWIN_MIGRATE_PAGE_SIZE") {
            config.service.page_size = Some(parse_env("TWIN_MIGRATE_PAGE_SIZE", &page_size)?);
        }

        if let Ok(policy) = env::var("TWIN_MIGRATE_PATCH_POLICY") {
            config.migration.patch_failure_policy = policy
                .parse::<PatchFailurePolicy>()
                .map_err(|e| AppError::new(ErrorCategory::ConfigError, e))?;
        }

        if let Ok(seconds) = env::var("TWIN_MIGRATE_MAX_RUNTIME_SECONDS") {
            config.migration.max_runtime_seconds =
                Some(parse_env("TWIN_MIGRATE_MAX_RUNTIME_SECONDS", &seconds)?);
        }

        Ok(())
    }

    /// Apply command-line overrides, the highest-precedence layer.
    pub fn apply_overrides(config: &mut MigrateConfig, overrides: &ConfigOverrides) {
        if let Some(endpoint) = &overrides.endpoint {
            config.service.endpoint = Some(endpoint.clone());
        }
        if let Some(policy) = overrides.patch_failure_policy {
            config.migration.patch_failure_policy = policy;
        }
        if let Some(max_runtime) = overrides.max_runtime {
            let whole_seconds = max_runtime.as_secs() + u64::from(max_runtime.subsec_nanos() > 0);
            config.migration.max_runtime_seconds = Some(whole_seconds);
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "TWIN_MIGRATE_ENDPOINT - Override service endpoint URL",
            "TWIN_MIGRATE_API_VERSION - Override api-version query parameter (default: 2023-10-31)",
            "TWIN_MIGRATE_TOKEN_ENV - Name of the variable holding the bearer token (default: TWIN_MIGRATE_ACCESS_TOKEN)",
            "TWIN_MIGRATE_PAGE_SIZE - Maximum twins per query page",
            "TWIN_MIGRATE_PATCH_POLICY - continue-on-error or abort-on-error (default: continue-on-error)",
            "TWIN_MIGRATE_MAX_RUNTIME_SECONDS - Cancel outstanding migrations after this many seconds",
        ]
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        AppError::new(
            ErrorCategory::ConfigError,
            format!("{} has invalid value '{}': {}", name, value, e),
        )
    })
}
