//! Configuration for the batcher module

use std::path::PathBuf;

/// Configuration for validation, batching and batch output
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of records per batch
    pub batch_size: usize,

    /// Records with fewer words are dropped
    pub min_word_count: usize,

    /// Records with more words are truncated to this many words
    pub max_word_count: usize,

    /// Number of content characters used to backfill a missing description
    pub description_chars: usize,

    /// Whether JSONL content is rewritten for indexing
    pub optimize_content: bool,

    /// Directory batch files and metadata are written to
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            min_word_count: 10,
            max_word_count: 10_000,
            description_chars: 160,
            optimize_content: true,
            output_dir: PathBuf::from("data/batches"),
        }
    }
}

/// Builder for BatchConfig
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of records per batch
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Set the minimum word count
    pub fn min_word_count(mut self, min_word_count: usize) -> Self {
        self.config.min_word_count = min_word_count;
        self
    }

    /// Set the maximum word count
    pub fn max_word_count(mut self, max_word_count: usize) -> Self {
        self.config.max_word_count = max_word_count;
        self
    }

    /// Set the description backfill length
    pub fn description_chars(mut self, description_chars: usize) -> Self {
        self.config.description_chars = description_chars;
        self
    }

    /// Enable or disable content optimization on write
    pub fn optimize_content(mut self, optimize_content: bool) -> Self {
        self.config.optimize_content = optimize_content;
        self
    }

    /// Set the output directory
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = output_dir.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> BatchConfig {
        self.config
    }
}

impl BatchConfig {
    /// Create a new builder
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::new()
    }
}
