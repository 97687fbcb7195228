use crate::core::error::MigrationError;
use crate::core::model::{ModelBatch, PublishedSet};
use crate::twins::TwinService;
use std::sync::Arc;

/// Uploads a model batch to the registry as a single atomic call.
pub struct ModelPublisher {
    service: Arc<dyn TwinService>,
}

impl ModelPublisher {
    pub fn new(service: Arc<dyn TwinService>) -> Self {
        ModelPublisher { service }
    }

    /// Publish the whole batch. Either every model is accepted and the batch
    /// comes back as a [`PublishedSet`], or nothing is and migration must not
    /// start.
    pub async fn publish(&self, batch: ModelBatch) -> Result<PublishedSet, MigrationError> {
        if batch.is_empty() {
            return Err(MigrationError::EmptyBatch);
        }
        tracing::info!(models = batch.len(), "publishing model batch");
        self.service
            .create_models(&batch.documents())
            .await
            .map_err(|cause| MigrationError::PublishFailed { cause })?;
        tracing::info!(models = batch.len(), "model batch accepted by registry");
        Ok(PublishedSet::accepted(batch))
    }
}
