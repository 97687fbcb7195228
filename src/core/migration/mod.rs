//! Publish-then-migrate pipeline.
pub mod completion;
pub mod coordinator;
pub mod task;

pub use coordinator::{MigrationCoordinator, MigrationOptions};
pub use task::{TaskSettings, TaskState, TwinMigrationTask};

use crate::core::error::MigrationError;
use crate::core::model::{ModelBatch, PublishedSet};
use crate::core::publisher::ModelPublisher;
use crate::twins::TwinService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use twin_migrate_types::MigrationReport;

/// How a pipeline run ended when it did not hit a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to publish; no remote call was made.
    NoModels,
    Completed(MigrationReport),
}

/// Publishes a batch and, only if the registry accepts it, migrates every
/// model's twins.
pub struct MigrationPipeline {
    publisher: ModelPublisher,
    coordinator: MigrationCoordinator,
}

impl MigrationPipeline {
    pub fn new(service: Arc<dyn TwinService>, options: MigrationOptions) -> Self {
        MigrationPipeline {
            publisher: ModelPublisher::new(Arc::clone(&service)),
            coordinator: MigrationCoordinator::new(service, options),
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.coordinator.cancellation_token()
    }

    /// Returns `Err` only for failures that stop the run before migration
    /// starts. Per-model failures are carried inside the report.
    pub async fn run(&self, batch: ModelBatch) -> Result<RunOutcome, MigrationError> {
        if batch.is_empty() {
            return Ok(RunOutcome::NoModels);
        }
        let published = if self.coordinator.options().dry_run {
            tracing::info!(models = batch.len(), "dry run: model upload skipped");
            PublishedSet::assume_published(batch)
        } else {
            self.publisher.publish(batch).await?
        };
        let report = self.coordinator.run_all(&published).await;
        Ok(RunOutcome::Completed(report))
    }
}
