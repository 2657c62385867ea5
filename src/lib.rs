//! # sitelens - Website Relevance Analysis for Rust
//!
//! This crate crawls a website, turns its pages into clean text records,
//! packs them into batches for bulk indexing and grades how well the indexed
//! corpus matches a set of target keywords.
//!
//! ## Features
//!
//! - Breadth-first same-domain URL discovery with exclusion filtering
//! - HTML content extraction with main-content detection
//! - Deterministic, all-or-nothing batching into JSON Lines files
//! - Pluggable blob store, document index and notifier collaborators
//! - Relevance scoring combining TF-IDF term statistics with embedding
//!   similarity, plus tiered recommendations
//! - Async API with Tokio
//! - Structured logging through `tracing`
//!
//! ## Example
//!
//! ```rust,no_run
//! use sitelens::index::{LocalBlobStore, MemoryIndex, TracingNotifier};
//! use sitelens::model::HashingEmbedder;
//! use sitelens::pipeline::{Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default().with_data_dir("data");
//!     let pipeline = Pipeline::new(
//!         config,
//!         LocalBlobStore::new("data/blobs"),
//!         MemoryIndex::new(LocalBlobStore::new("data/blobs")),
//!         TracingNotifier,
//!         HashingEmbedder::default(),
//!     )?;
//!
//!     let keywords = vec!["rust".to_string(), "crawler".to_string()];
//!     let report = pipeline
//!         .run("https://example.com/", "rust crawler", &keywords)
//!         .await?;
//!
//!     println!("Score: {:.1}%", report.analysis.analysis.composite_score * 100.0);
//!     Ok(())
//! }
//! ```

mod error;

pub mod batcher;
pub mod crawler;
pub mod index;
pub mod model;
pub mod pipeline;
pub mod scorer;

pub use error::{Error, Result};

/// Re-export of commonly used types
pub mod prelude {
    pub use crate::batcher::{BatchConfig, Batcher, BatchSummary};
    pub use crate::crawler::{ContentExtractor, Crawler, CrawlerConfig, PageRecord};
    pub use crate::error::{Error, Result};
    pub use crate::index::{BlobStore, DocumentIndex, Notifier, SearchResult};
    pub use crate::pipeline::{Pipeline, PipelineConfig};
    pub use crate::scorer::{RelevanceAnalysis, RelevanceScorer, ScorerConfig};
}
