//! Remote model registry and twin instance store.
pub mod client;

pub use client::{Credential, DigitalTwinsClient, ServiceEndpoint};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

/// A twin as seen through a query: its identity and current model binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwinInstance {
    pub instance_id: String,
    pub current_model_id: String,
}

/// Lazily paged sequence of twins returned by an instance query.
pub type InstanceStream<'a> = BoxStream<'a, Result<TwinInstance, ServiceError>>;

/// Operations the migration engine needs from the remote service.
///
/// Implementations are shared by every concurrent migration task and must
/// tolerate concurrent calls.
#[async_trait]
pub trait TwinService: Send + Sync {
    /// Upload all model documents in one all-or-nothing call.
    async fn create_models(&self, documents: &[Value]) -> Result<(), ServiceError>;

    /// Every twin currently bound exactly to `model_id`, page by page.
    fn query_instances_of_model<'a>(&'a self, model_id: &'a str) -> InstanceStream<'a>;

    /// Rebind a single twin to `model_id`. Reapplying the same binding succeeds.
    async fn patch_instance_model_binding(
        &self,
        instance_id: &str,
        model_id: &str,
    ) -> Result<(), ServiceError>;
}

/// Errors surfaced by the remote service boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
