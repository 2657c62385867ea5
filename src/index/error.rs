//! Error types for the index collaborators

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for blob store, index and notifier operations
#[derive(Debug, Error)]
pub enum IndexError {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Path cannot be used as a blob key
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    /// Import produced no documents
    #[error("Import failed: {0}")]
    Import(String),
}

impl From<IndexError> for CrateError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Io(e) => CrateError::Io(e),
            IndexError::Json(e) => CrateError::Json(e),
            _ => CrateError::Index(err.to_string()),
        }
    }
}
