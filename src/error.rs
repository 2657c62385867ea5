//! Error types for the sitelens crate

use thiserror::Error;

/// Result type for sitelens operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sitelens operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Page discovery or extraction error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Raw record storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Batch validation or writing error
    #[error("Batch error: {0}")]
    Batch(String),

    /// Blob store, document index or notifier error
    #[error("Index error: {0}")]
    Index(String),

    /// Relevance scoring error
    #[error("Score error: {0}")]
    Score(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
