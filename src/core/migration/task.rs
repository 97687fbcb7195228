use crate::core::error::MigrationError;
use crate::core::model::predecessor_of;
use crate::core::types::PatchFailurePolicy;
use crate::twins::TwinService;
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use twin_migrate_types::{InstanceFailure, ModelReport, TaskOutcome};

/// Lifecycle of a single model's migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Resolving,
    Querying,
    /// Patching the twin at this position in query order.
    Patching(usize),
    Done,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Failed)
    }
}

/// Per-task behaviour shared by every task in a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskSettings {
    pub patch_failure_policy: PatchFailurePolicy,
    pub dry_run: bool,
}

/// Migrates every twin bound to a model's predecessor onto the model itself.
///
/// Twins are discovered in full before the first patch is sent, then patched
/// one at a time in query order. Cancellation is observed while waiting on a
/// query page, while waiting on a patch response, and before each patch.
pub struct TwinMigrationTask {
    model_id: String,
    service: Arc<dyn TwinService>,
    settings: TaskSettings,
    cancel: CancellationToken,
    state: TaskState,
    report: ModelReport,
}

impl TwinMigrationTask {
    pub fn new(
        model_id: impl Into<String>,
        service: Arc<dyn TwinService>,
        settings: TaskSettings,
        cancel: CancellationToken,
    ) -> Self {
        let model_id = model_id.into();
        TwinMigrationTask {
            report: ModelReport::pending(model_id.clone()),
            model_id,
            service,
            settings,
            cancel,
            state: TaskState::Pending,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Drive the task to a terminal state and return its report entry.
    /// Never fails: every error becomes a `Failed` outcome with a cause.
    pub async fn run(mut self) -> ModelReport {
        match self.execute().await {
            Ok(()) if self.report.failed_instances.is_empty() => {
                self.transition(TaskState::Done);
                self.report.outcome = TaskOutcome::Done;
                tracing::info!(
                    discovered = self.report.discovered,
                    patched = self.report.patched,
                    "model migration done"
                );
            }
            Ok(()) => {
                let cause = format!(
                    "{} of {} twin patches failed",
                    self.report.failed_instances.len(),
                    self.report.discovered
                );
                self.fail(cause);
            }
            Err(err) => self.fail(err.to_string()),
        }
        self.report
    }

    async fn execute(&mut self) -> Result<(), MigrationError> {
        self.transition(TaskState::Resolving);
        let predecessor = predecessor_of(&self.model_id)?;
        self.report.predecessor_id = Some(predecessor.clone());

        self.transition(TaskState::Querying);
        let instances = self.discover(&predecessor).await?;
        self.report.discovered = instances.len();
        tracing::info!(predecessor = %predecessor, twins = instances.len(), "twins discovered");

        if self.settings.dry_run {
            return Ok(());
        }

        for (index, instance_id) in instances.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(MigrationError::Cancelled);
            }
            self.transition(TaskState::Patching(index));
            match self.patch(&instance_id).await {
                Ok(()) => self.report.patched += 1,
                Err(MigrationError::Cancelled) => return Err(MigrationError::Cancelled),
                Err(err) => {
                    tracing::warn!(instance_id = %instance_id, "{}", err);
                    self.report.failed_instances.push(InstanceFailure {
                        instance_id,
                        cause: err.to_string(),
                    });
                    if self.settings.patch_failure_policy == PatchFailurePolicy::AbortOnError {
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    async fn discover(&self, predecessor: &str) -> Result<Vec<String>, MigrationError> {
        let mut stream = self.service.query_instances_of_model(predecessor);
        let mut instance_ids = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(MigrationError::Cancelled),
                next = stream.next() => next,
            };
            match next {
                Some(Ok(instance)) => instance_ids.push(instance.instance_id),
                Some(Err(cause)) => {
                    return Err(MigrationError::QueryFailed {
                        model_id: predecessor.to_string(),
                        cause,
                    })
                }
                None => return Ok(instance_ids),
            }
        }
    }

    async fn patch(&self, instance_id: &str) -> Result<(), MigrationError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(MigrationError::Cancelled),
            result = self.service.patch_instance_model_binding(instance_id, &self.model_id) => {
                result.map_err(|cause| MigrationError::PatchFailed {
                    instance_id: instance_id.to_string(),
                    cause,
                })
            }
        }
    }

    fn fail(&mut self, cause: String) {
        self.transition(TaskState::Failed);
        tracing::warn!(cause = %cause, "model migration failed");
        self.report.outcome = TaskOutcome::Failed;
        self.report.cause = Some(cause);
    }

    fn transition(&mut self, next: TaskState) {
        tracing::debug!(from = ?self.state, to = ?next, "task state");
        self.state = next;
    }
}
