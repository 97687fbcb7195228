use crate::core::results_processor::OutputFormat;
use crate::core::types::PatchFailurePolicy;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Model files or directories to load (directories are walked recursively)
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Base URL of the digital twins service (overrides config and TWIN_MIGRATE_ENDPOINT)
    #[arg(long, value_name = "URL", help_heading = "Service")]
    pub endpoint: Option<String>,

    /// Path to custom config file (default: ./twin-migrate.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// What a failed twin patch does to the rest of its model's migration
    #[arg(long, value_enum, value_name = "POLICY", help_heading = "Migration")]
    pub patch_policy: Option<PatchFailurePolicy>,

    /// Cancel outstanding migrations after this long (e.g. 90s, 5m)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, help_heading = "Migration")]
    pub max_runtime: Option<Duration>,

    /// Resolve predecessors and count twins without uploading or patching anything
    #[arg(long, help_heading = "Migration")]
    pub dry_run: bool,

    /// Report format written to stdout
    #[arg(long, value_enum, default_value = "text", help_heading = "Output Options")]
    pub format: OutputFormat,
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(value).map_err(|e| e.to_string())?;
    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}
