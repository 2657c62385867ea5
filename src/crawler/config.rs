//! # Crawler Configuration Module
//!
//! Configuration for URL discovery and content extraction. Both stages share
//! one immutable `CrawlerConfig`, built either from `Default` or through
//! `CrawlerConfigBuilder`.

use std::time::Duration;

/// Configuration for the crawler and the content extractor
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum number of pages to discover
    pub max_pages: usize,

    /// Delay in milliseconds applied after every request
    pub rate_limit_ms: u64,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent to use for requests
    pub user_agent: String,

    /// Additional URL exclusion regexes, appended to the fixed set
    pub exclude_patterns: Vec<String>,

    /// CSS selectors for the main content element, tried in order
    pub content_selectors: Vec<String>,

    /// CSS selectors for elements whose text is dropped
    pub exclude_selectors: Vec<String>,

    /// Pages with fewer words than this are discarded
    pub min_word_count: usize,

    /// Maximum stored content length in characters
    pub max_content_chars: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            rate_limit_ms: 1000,
            timeout_secs: 30,
            user_agent: format!("sitelens-crawler/{}", env!("CARGO_PKG_VERSION")),
            exclude_patterns: Vec::new(),
            content_selectors: vec![
                "article".to_string(),
                "main".to_string(),
                ".content".to_string(),
                "#content".to_string(),
                ".post-content".to_string(),
                ".entry-content".to_string(),
                ".article-content".to_string(),
            ],
            exclude_selectors: vec![
                "script".to_string(),
                "style".to_string(),
                "nav".to_string(),
                "footer".to_string(),
                "header".to_string(),
                "aside".to_string(),
            ],
            min_word_count: 10,
            max_content_chars: 10_000,
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the maximum number of pages to discover
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the delay in milliseconds applied after every request
    pub fn rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.config.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set additional URL exclusion regexes
    pub fn exclude_patterns(mut self, exclude_patterns: Vec<String>) -> Self {
        self.config.exclude_patterns = exclude_patterns;
        self
    }

    /// Set the CSS selectors for the main content element
    pub fn content_selectors(mut self, content_selectors: Vec<String>) -> Self {
        self.config.content_selectors = content_selectors;
        self
    }

    /// Set the CSS selectors for elements to exclude
    pub fn exclude_selectors(mut self, exclude_selectors: Vec<String>) -> Self {
        self.config.exclude_selectors = exclude_selectors;
        self
    }

    /// Set the minimum word count for a page to be kept
    pub fn min_word_count(mut self, min_word_count: usize) -> Self {
        self.config.min_word_count = min_word_count;
        self
    }

    /// Set the maximum stored content length in characters
    pub fn max_content_chars(mut self, max_content_chars: usize) -> Self {
        self.config.max_content_chars = max_content_chars;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the rate limit as a Duration
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
