//! Error types for the scorer module

use crate::error::Error as CrateError;
use rig::embeddings::EmbeddingError;
use thiserror::Error;

/// Error type for scoring operations
#[derive(Debug, Error)]
pub enum ScoreError {
    /// No term survived tokenization and stop-word removal
    #[error("Empty vocabulary: every document contains only stop words")]
    EmptyVocabulary,

    /// Keyword similarity requested without any keyword
    #[error("No target keywords given")]
    NoKeywords,

    /// Embedding model failure
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Embedding model returned fewer vectors than texts sent
    #[error("Expected {expected} embeddings, got {actual}")]
    MissingEmbeddings { expected: usize, actual: usize },

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ScoreError> for CrateError {
    fn from(err: ScoreError) -> Self {
        match err {
            ScoreError::Io(e) => CrateError::Io(e),
            ScoreError::Json(e) => CrateError::Json(e),
            _ => CrateError::Score(err.to_string()),
        }
    }
}
