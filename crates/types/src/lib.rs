//! Wire and report types shared between the twin-migrate engine and its consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of a `POST /query` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// One page of query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

/// Twin record as returned by the instance store. Only the identity and the
/// model binding are read; every other property is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalTwin {
    #[serde(rename = "$dtId")]
    pub dt_id: String,
    #[serde(rename = "$metadata")]
    pub metadata: TwinMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinMetadata {
    #[serde(rename = "$model")]
    pub model: String,
}

/// A single JSON Patch (RFC 6902) operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPatchOperation {
    pub op: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl JsonPatchOperation {
    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: "replace".to_string(),
            path: path.into(),
            value: Some(value),
        }
    }
}

/// Error envelope returned by the service on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorEnvelope {
    pub error: ServiceErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Terminal (or not yet terminal) outcome of one model's migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskOutcome {
    #[default]
    Pending,
    Done,
    Failed,
}

impl TaskOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskOutcome::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskOutcome::Pending => "Pending",
            TaskOutcome::Done => "Done",
            TaskOutcome::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A twin whose model binding could not be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceFailure {
    pub instance_id: String,
    pub cause: String,
}

/// Per-model entry of a [`MigrationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelReport {
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predecessor_id: Option<String>,
    pub outcome: TaskOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    pub discovered: usize,
    pub patched: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_instances: Vec<InstanceFailure>,
}

impl ModelReport {
    pub fn pending(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            predecessor_id: None,
            outcome: TaskOutcome::Pending,
            cause: None,
            discovered: 0,
            patched: 0,
            failed_instances: Vec::new(),
        }
    }
}

/// Summary of one migration run across every published model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_millis: i64,
    pub per_model: Vec<ModelReport>,
}

impl MigrationReport {
    /// Build a report from per-model entries, deriving the counters.
    pub fn from_entries(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        dry_run: bool,
        elapsed_millis: i64,
        per_model: Vec<ModelReport>,
    ) -> Self {
        let succeeded = per_model
            .iter()
            .filter(|entry| entry.outcome == TaskOutcome::Done)
            .count();
        let failed = per_model
            .iter()
            .filter(|entry| entry.outcome == TaskOutcome::Failed)
            .count();
        Self {
            run_id,
            started_at,
            dry_run,
            total: per_model.len(),
            succeeded,
            failed,
            elapsed_millis,
            per_model,
        }
    }

    pub fn entry(&self, model_id: &str) -> Option<&ModelReport> {
        self.per_model
            .iter()
            .find(|entry| entry.model_id == model_id)
    }
}
