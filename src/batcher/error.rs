//! Error types for the batcher module

use crate::error::Error as CrateError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for batching operations
#[derive(Debug, Error)]
pub enum BatchError {
    /// Input cannot be batched
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Staged file could not be moved into place
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<BatchError> for CrateError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Io(e) => CrateError::Io(e),
            BatchError::Json(e) => CrateError::Json(e),
            _ => CrateError::Batch(err.to_string()),
        }
    }
}
