use crate::core::types::PatchFailurePolicy;
use serde::{Deserialize, Serialize};

pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;

/// Main configuration loaded from twin-migrate.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MigrateConfig {
    /// Remote service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Migration behaviour
    #[serde(default)]
    pub migration: MigrationConfig,

    /// Model file discovery
    #[serde(default)]
    pub models: ModelsConfig,
}

/// Remote service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Base URL of the twin service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Value sent as the `api-version` query parameter
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Upper bound on twins per query page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// Migration configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MigrationConfig {
    /// What to do when a single twin patch fails
    #[serde(default)]
    pub patch_failure_policy: PatchFailurePolicy,

    /// Cancel outstanding migrations after this many seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_runtime_seconds: Option<u64>,
}

/// Model file configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelsConfig {
    /// File extensions treated as model definitions
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_api_version() -> String {
    "2023-10-31".to_string()
}

fn default_token_env() -> String {
    "TWIN_MIGRATE_ACCESS_TOKEN".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["json".to_string()]
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            endpoint: None,
            api_version: default_api_version(),
            token_env: default_token_env(),
            page_size: None,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        ModelsConfig {
            extensions: default_extensions(),
        }
    }
}
