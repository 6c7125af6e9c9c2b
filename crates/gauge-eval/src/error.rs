//! Error types for suite execution

use gauge_core::GaugeError;
use std::path::Path;
use thiserror::Error;

/// Result type alias for benchmark operations
pub type BenchResult<T> = Result<T, BenchError>;

/// Failures that abort a suite
///
/// Per-instance failures never surface here; they are recorded as
/// unsuccessful task results.
#[derive(Error, Debug, Clone)]
pub enum BenchError {
    /// Dataset could not be loaded or parsed
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Result store could not be opened or written
    #[error("Result store error: {0}")]
    Store(String),

    /// Prompt strategy name not in the registry
    #[error("Unknown prompt strategy '{name}'. Available: {available}")]
    UnknownStrategy { name: String, available: String },

    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl BenchError {
    /// Dataset error naming the offending file
    pub fn dataset_at(path: &Path, message: impl std::fmt::Display) -> Self {
        Self::Dataset(format!("{}: {}", path.display(), message))
    }

    /// Store error naming the offending file
    pub fn store_at(path: &Path, message: impl std::fmt::Display) -> Self {
        Self::Store(format!("{}: {}", path.display(), message))
    }
}

impl From<std::io::Error> for BenchError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl From<GaugeError> for BenchError {
    fn from(error: GaugeError) -> Self {
        match error {
            GaugeError::Config { message, .. } => Self::Config(message),
            other => Self::Io(other.to_string()),
        }
    }
}
