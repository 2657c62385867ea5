//! # Website Crawler Module
//!
//! This module discovers the crawlable pages of a website and reduces each of
//! them to a normalized [`PageRecord`]. It is the first stage of the pipeline:
//! its output feeds the batcher, which prepares the corpus for bulk indexing.
//!
//! ## Key Components
//!
//! - `UrlFilter` / `is_excluded`: pure predicate rejecting file downloads,
//!   admin/login paths, print variants and anchors
//! - `CrawlFrontier`: breadth-first frontier with O(1) membership checks
//! - `Crawler`: bounded, same-domain URL discovery
//! - `ContentExtractor`: title, description, cleaned text, headings and links
//!   for a single page, with a minimum word-count gate
//! - `storage`: persistence of extracted records as one JSON document
//!
//! ## Failure Model
//!
//! Fetch failures are per-item: a URL that times out, answers with a non-2xx
//! status or cannot be parsed is logged and skipped. Only an unusable seed URL
//! is reported to the caller.

mod config;
mod content_extraction;
mod discovery;
mod error;
mod fetch;
mod filter;
mod frontier;
pub mod storage;

pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use content_extraction::{ContentExtractor, parse_page};
pub use discovery::Crawler;
pub use error::CrawlError;
pub use fetch::Fetcher;
pub use filter::{DEFAULT_EXCLUDE_PATTERNS, UrlFilter, is_excluded};
pub use frontier::CrawlFrontier;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

/// A page reduced to its textual content and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL of the page
    #[serde(default)]
    pub url: String,

    /// Text of the `<title>` element, empty if absent
    #[serde(default)]
    pub title: String,

    /// Content of the `description` meta tag, empty if absent
    #[serde(default, alias = "meta_description")]
    pub description: String,

    /// Cleaned body text
    #[serde(default)]
    pub content: String,

    /// Headings in document order
    #[serde(default)]
    pub headings: Vec<Heading>,

    /// Absolute outbound links
    #[serde(default)]
    pub links: BTreeSet<String>,

    /// Number of whitespace-delimited tokens in `content`
    #[serde(default)]
    pub word_count: usize,

    /// When the page was extracted
    #[serde(default = "Utc::now")]
    pub extracted_at: DateTime<Utc>,
}

/// A heading found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level, 1 through 6
    pub level: u8,

    /// Heading text with whitespace collapsed
    pub text: String,
}

/// Count whitespace-delimited tokens
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Network authority (`host[:port]`) of a URL
///
/// Default ports are already elided by the `url` crate, so `http://a.com:80/`
/// and `http://a.com/` share an authority.
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
