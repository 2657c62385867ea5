//! # Index Collaborators Module
//!
//! Contracts for the services the pipeline hands its output to: a blob store
//! holding batch files, a document index that imports those batches and
//! answers searches, and a notifier announcing that new batches are ready.
//!
//! The pipeline only talks to these traits. Local implementations are
//! provided so the whole flow runs without any managed service:
//!
//! - `LocalBlobStore`: directory-backed blob store
//! - `MemoryIndex`: in-memory index over imported JSON Lines batches
//! - `TracingNotifier`: publishes messages to the log

mod blob;
mod error;
mod memory;
mod notify;

pub use blob::LocalBlobStore;
pub use error::IndexError;
pub use memory::MemoryIndex;
pub use notify::TracingNotifier;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// Opaque address of an object in a [`BlobStore`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// Wrap a raw locator string
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// The locator as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of importing one object into a [`DocumentIndex`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatus {
    pub locator: Locator,
    pub documents: usize,
    pub skipped: usize,
}

/// One hit returned by a [`DocumentIndex`] search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    /// Relevance reported by the index, expected in `[0, 1]`
    pub relevance_score: f64,
    #[serde(default)]
    pub uri: String,
}

/// Key-value object storage
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `path`, returning its locator
    fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<Locator, IndexError>> + Send;

    /// Read the object behind `locator`
    fn get(&self, locator: &Locator) -> impl Future<Output = Result<Vec<u8>, IndexError>> + Send;

    /// Whether an object exists behind `locator`
    fn exists(&self, locator: &Locator) -> impl Future<Output = Result<bool, IndexError>> + Send;

    /// Locator `path` would be stored under
    fn locate(&self, path: &str) -> Locator;
}

/// Searchable document collection fed from blob-stored batches
pub trait DocumentIndex: Send + Sync {
    /// Import the batch behind `locator`
    fn import(
        &self,
        locator: &Locator,
    ) -> impl Future<Output = Result<ImportStatus, IndexError>> + Send;

    /// Search for `query`, boosting documents that mention `keywords`
    fn search(
        &self,
        query: &str,
        keywords: &[String],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SearchResult>, IndexError>> + Send;
}

/// Publish/subscribe message sink
pub trait Notifier: Send + Sync {
    /// Publish `message` on `topic`
    fn publish(
        &self,
        topic: &str,
        message: serde_json::Value,
    ) -> impl Future<Output = Result<(), IndexError>> + Send;
}
