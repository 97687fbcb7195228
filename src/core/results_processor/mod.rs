#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use twin_migrate_types::{MigrationReport, ModelReport, TaskOutcome};

/// How a finished report is rendered for the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON payload suitable for downstream tooling
    Json,
}

pub struct ResultsProcessor;

impl ResultsProcessor {
    pub fn generate_report(
        report: &MigrationReport,
        output_format: OutputFormat,
    ) -> Result<String, AppError> {
        match output_format {
            OutputFormat::Json => Self::generate_json_report(report),
            OutputFormat::Text => Ok(Self::generate_text_report(report)),
        }
    }

    fn generate_json_report(report: &MigrationReport) -> Result<String, AppError> {
        serde_json::to_string_pretty(report).map_err(|e| {
            AppError::with_source(
                ErrorCategory::InternalError,
                "failed to serialize migration report",
                e,
            )
            .with_code("REPORT-JSON-001")
        })
    }

    pub fn generate_text_report(report: &MigrationReport) -> String {
        let mut text = String::new();
        text.push_str(&build_header_section(report));
        text.push_str(&build_models_section(&report.per_model));
        text.push_str(&build_failures_section(&report.per_model));
        text
    }
}

fn build_header_section(report: &MigrationReport) -> String {
    let mut section = String::new();
    section.push_str("=== Migration Summary ===\n\n");
    section.push_str(&format!("Run ID: {}\n", report.run_id));
    section.push_str(&format!(
        "Mode: {}\n",
        if report.dry_run { "dry run" } else { "live" }
    ));
    section.push_str(&format!(
        "Total: {}  Succeeded: {}  Failed: {}\n",
        report.total, report.succeeded, report.failed
    ));
    section.push_str(&format!("Elapsed: {} ms\n", report.elapsed_millis));
    section
}

fn build_models_section(entries: &[ModelReport]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let mut section = String::from("\nModels:\n");
    for entry in entries {
        let target = match &entry.predecessor_id {
            Some(predecessor) => format!("{} <- {}", entry.model_id, predecessor),
            None => entry.model_id.clone(),
        };
        section.push_str(&format!(
            "  {:<7} {} ({} discovered, {} patched)\n",
            entry.outcome.as_str(),
            target,
            entry.discovered,
            entry.patched
        ));
    }
    section
}

fn build_failures_section(entries: &[ModelReport]) -> String {
    let failed: Vec<&ModelReport> = entries
        .iter()
        .filter(|entry| entry.outcome == TaskOutcome::Failed)
        .collect();
    if failed.is_empty() {
        return String::new();
    }
    let mut section = String::from("\nFailures:\n");
    for entry in failed {
        section.push_str(&format!(
            "  {}: {}\n",
            entry.model_id,
            entry.cause.as_deref().unwrap_or("unknown cause")
        ));
        for instance in &entry.failed_instances {
            section.push_str(&format!("    {}: {}\n", instance.instance_id, instance.cause));
        }
    }
    section
}
