use crate::core::types::{ErrorCategory, ErrorSeverity};
use crate::twins::ServiceError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Run-fatal error carrying enough context to explain why nothing (or not
/// everything) was attempted.
#[derive(Debug)]
pub struct AppError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub code: String,
    pub message: String,
    pub context: HashMap<String, String>,
    pub occurred_at: DateTime<Utc>,
    pub source: Option<anyhow::Error>,
}

impl AppError {
    pub fn new<T: Into<String>>(category: ErrorCategory, message: T) -> Self {
        AppError {
            category,
            severity: ErrorSeverity::Error,
            code: default_code(category).to_string(),
            message: message.into(),
            context: HashMap::new(),
            occurred_at: Utc::now(),
            source: None,
        }
    }

    pub fn with_source<T: Into<String>>(
        category: ErrorCategory,
        message: T,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        let mut error = AppError::new(category, message);
        error.source = Some(source.into());
        error
    }

    pub fn with_code<T: Into<String>>(mut self, code: T) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }
}

fn default_code(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::ValidationError => "TM-VAL-001",
        ErrorCategory::ConfigError => "TM-CFG-001",
        ErrorCategory::IoError => "TM-IO-001",
        ErrorCategory::PublishError => "TM-PUB-001",
        ErrorCategory::RemoteError => "TM-RMT-001",
        ErrorCategory::InternalError => "TM-INT-001",
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.category, self.message)?;
        if !self.context.is_empty() {
            let mut keys: Vec<_> = self.context.keys().collect();
            keys.sort();
            let rendered: Vec<String> = keys
                .into_iter()
                .map(|key| format!("{}={}", key, self.context[key]))
                .collect();
            write!(f, " ({})", rendered.join(", "))?;
        }
        if let Some(ref source) = self.source {
            write!(f, "\nCaused by: {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::with_source(ErrorCategory::IoError, e.to_string(), e)
    }
}

impl From<MigrationError> for AppError {
    fn from(e: MigrationError) -> Self {
        let (category, message) = match &e {
            MigrationError::PublishFailed { .. } => (
                ErrorCategory::PublishError,
                "model publish failed; no twins were migrated",
            ),
            MigrationError::EmptyBatch => (ErrorCategory::ValidationError, "no models to publish"),
            MigrationError::InvalidModelIdentifier { .. } => {
                (ErrorCategory::ValidationError, "model identifier rejected")
            }
            MigrationError::QueryFailed { .. } | MigrationError::PatchFailed { .. } => {
                (ErrorCategory::RemoteError, "twin service request failed")
            }
            MigrationError::Cancelled => (ErrorCategory::InternalError, "migration cancelled"),
        };
        AppError::with_source(category, message, e)
    }
}

/// Typed causes for everything that can go wrong while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("invalid model identifier '{model_id}': {reason}")]
    InvalidModelIdentifier { model_id: String, reason: String },
    #[error("model registry rejected the batch: {cause}")]
    PublishFailed { cause: ServiceError },
    #[error("query for instances of '{model_id}' failed: {cause}")]
    QueryFailed { model_id: String, cause: ServiceError },
    #[error("patching twin '{instance_id}' failed: {cause}")]
    PatchFailed {
        instance_id: String,
        cause: ServiceError,
    },
    #[error("migration cancelled")]
    Cancelled,
    #[error("model batch is empty")]
    EmptyBatch,
}

impl MigrationError {
    pub fn invalid_identifier(model_id: &str, reason: impl Into<String>) -> Self {
        MigrationError::InvalidModelIdentifier {
            model_id: model_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, MigrationError::Cancelled)
    }
}

/// Sink for operator-facing diagnostics, passed explicitly to the components
/// that need one.
pub trait ErrorReporter: Send + Sync {
    fn report_error(&self, error: &AppError);
    fn report_warning(&self, message: &str, context: Option<String>);
}

/// Reporter that forwards to the active tracing subscriber.
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report_error(&self, error: &AppError) {
        tracing::error!(code = %error.code, category = %error.category, "{}", error.message);
        if let Some(ref source) = error.source {
            tracing::error!(code = %error.code, "caused by: {}", source);
        }
    }

    fn report_warning(&self, message: &str, context: Option<String>) {
        match context {
            Some(ctx) => tracing::warn!(context = %ctx, "{}", message),
            None => tracing::warn!("{}", message),
        }
    }
}
