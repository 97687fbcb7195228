#![allow(clippy::result_large_err)]

use super::MigrateConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use url::Url;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules. Returns the parsed endpoint on success.
    pub fn validate(config: &MigrateConfig) -> Result<Url, AppError> {
        let endpoint = config.service.endpoint.as_deref().ok_or_else(|| {
            AppError::new(
                ErrorCategory::ConfigError,
                "service.endpoint is required (set it in twin-migrate.toml, TWIN_MIGRATE_ENDPOINT, or --endpoint)",
            )
        })?;
        let url = Url::parse(endpoint).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("service.endpoint '{}' is not a valid URL: {}", endpoint, e),
            )
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                format!("service.endpoint must use http or https, got '{}'", url.scheme()),
            ));
        }

        if config.service.api_version.trim().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "service.api_version cannot be empty",
            ));
        }

        if config.service.page_size == Some(0) {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "service.page_size must be at least 1",
            ));
        }

        if config.migration.max_runtime_seconds == Some(0) {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "migration.max_runtime_seconds must be greater than zero",
            ));
        }

        if config
            .models
            .extensions
            .iter()
            .all(|ext| ext.trim_start_matches('.').trim().is_empty())
        {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "models.extensions must name at least one file extension",
            ));
        }

        Ok(url)
    }
}
