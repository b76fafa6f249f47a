//! Error types for Pulse Insights

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scoring employees or loading artifacts
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("Employee {employee_id} has {weeks} weeks of history, at least 4 are required")]
    InsufficientHistory { employee_id: i64, weeks: usize },

    #[error("Missing model file: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Invalid model artifact {artifact}: {reason}")]
    ArtifactInvalid { artifact: String, reason: String },

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PulseError {
    pub(crate) fn invalid_artifact(artifact: impl Into<String>, reason: impl Into<String>) -> Self {
        PulseError::ArtifactInvalid {
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error only concerns one employee of a batch
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PulseError::InsufficientHistory { .. })
    }
}
