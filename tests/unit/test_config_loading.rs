use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use twin_migrate::core::config::loader::{ConfigOverrides, CONFIG_FILE_NAME};
use twin_migrate::core::config::{ConfigLoader, ConfigValidator, MigrateConfig};
use twin_migrate::core::types::{ErrorCategory, PatchFailurePolicy};

const ENV_VARS: &[&str] = &[
    "TWIN_MIGRATE_ENDPOINT",
    "TWIN_MIGRATE_API_VERSION",
    "TWIN_MIGRATE_TOKEN_ENV",
    "TWIN_MIGRATE_PAGE_SIZE",
    "TWIN_MIGRATE_PATCH_POLICY",
    "TWIN_MIGRATE_MAX_RUNTIME_SECONDS",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_missing_file_yields_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    assert_eq!(config, MigrateConfig::default());
}

#[test]
#[serial]
fn test_workspace_file_is_loaded() {
    clear_env();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"
[service]
endpoint = "https://plant.api.weu.digitaltwins.azure.net"
page_size = 100

[migration]
patch_failure_policy = "abort-on-error"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    assert_eq!(
        config.service.endpoint.as_deref(),
        Some("https://plant.api.weu.digitaltwins.azure.net")
    );
    assert_eq!(config.service.page_size, Some(100));
    assert_eq!(config.service.api_version, "2023-10-31");
    assert_eq!(
        config.migration.patch_failure_policy,
        PatchFailurePolicy::AbortOnError
    );
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_env();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"
[service]
endpoint = "https://from-file.example.net"
api_version = "2022-05-31"
"#,
    )
    .unwrap();

    env::set_var("TWIN_MIGRATE_ENDPOINT", "https://from-env.example.net");
    env::set_var("TWIN_MIGRATE_PAGE_SIZE", "50");
    env::set_var("TWIN_MIGRATE_PATCH_POLICY", "abort");
    env::set_var("TWIN_MIGRATE_MAX_RUNTIME_SECONDS", "120");
    env::set_var("TWIN_MIGRATE_TOKEN_ENV", "ADT_TOKEN");

    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    clear_env();

    assert_eq!(
        config.service.endpoint.as_deref(),
        Some("https://from-env.example.net")
    );
    assert_eq!(config.service.api_version, "2022-05-31");
    assert_eq!(config.service.page_size, Some(50));
    assert_eq!(config.service.token_env, "ADT_TOKEN");
    assert_eq!(
        config.migration.patch_failure_policy,
        PatchFailurePolicy::AbortOnError
    );
    assert_eq!(config.migration.max_runtime_seconds, Some(120));
}

#[test]
#[serial]
fn test_invalid_env_value_is_a_config_error() {
    clear_env();
    env::set_var("TWIN_MIGRATE_PAGE_SIZE", "lots");
    let dir = TempDir::new().unwrap();
    let err = ConfigLoader::load_from_workspace(dir.path()).unwrap_err();
    clear_env();

    assert_eq!(err.category, ErrorCategory::ConfigError);
    assert!(err.message.contains("TWIN_MIGRATE_PAGE_SIZE"));
}

#[test]
#[serial]
fn test_explicit_config_must_exist() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let err = ConfigLoader::load_explicit(&dir.path().join("custom.toml")).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ConfigError);
    assert!(err.message.contains("does not exist"));
}

#[test]
#[serial]
fn test_malformed_toml_is_reported() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "[service\nendpoint = 1").unwrap();
    let err = ConfigLoader::load_explicit(&path).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ConfigError);
    assert!(err.message.starts_with("Failed to parse config file"));
}

#[test]
#[serial]
fn test_cli_overrides_then_validation() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let mut config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    assert!(ConfigValidator::validate(&config).is_err());

    ConfigLoader::apply_overrides(
        &mut config,
        &ConfigOverrides {
            endpoint: Some("http://localhost:8080".to_string()),
            patch_failure_policy: None,
            max_runtime: Some(Duration::from_millis(1500)),
        },
    );
    let url = ConfigValidator::validate(&config).unwrap();
    assert_eq!(url.port(), Some(8080));
    assert_eq!(config.migration.max_runtime_seconds, Some(2));
}
