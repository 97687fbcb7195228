use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    ValidationError,
    ConfigError,
    IoError,
    PublishError,
    RemoteError,
    InternalError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
    Info,
}

/// What a migration task does when a single twin patch fails.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PatchFailurePolicy {
    /// Record the failure and keep patching the remaining twins.
    #[default]
    ContinueOnError,
    /// Stop patching the model's remaining twins after the first failure.
    AbortOnError,
}

impl std::fmt::Display for PatchFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchFailurePolicy::ContinueOnError => write!(f, "continue-on-error"),
            PatchFailurePolicy::AbortOnError => write!(f, "abort-on-error"),
        }
    }
}

impl std::str::FromStr for PatchFailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "continue-on-error" | "continue" => Ok(PatchFailurePolicy::ContinueOnError),
            "abort-on-error" | "abort" => Ok(PatchFailurePolicy::AbortOnError),
            other => Err(format!(
                "invalid patch failure policy '{}'; supported values are continue-on-error, abort-on-error",
                other
            )),
        }
    }
}
