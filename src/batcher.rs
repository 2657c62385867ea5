//! # Batcher Module
//!
//! Turns a collection of extracted page records into fixed-size batches that
//! can be submitted to a document index in bulk.
//!
//! Processing happens in two passes. Validation drops unusable records,
//! truncates oversized ones and backfills missing titles and descriptions.
//! Partitioning then splits the validated records into contiguous,
//! order-preserving chunks of at most `batch_size` records, each described by
//! a [`BatchMetadata`] entry.
//!
//! Writing is handled by [`BatchWriter`]: every batch is serialized as JSON
//! Lines next to a single `batches_metadata.json`, and either all of those
//! files appear on disk or none of them do.

mod config;
mod error;
mod validation;
mod writer;

pub use config::{BatchConfig, BatchConfigBuilder};
pub use error::BatchError;
pub use validation::{ValidationStats, validate};
pub use writer::{BatchSummary, BatchWriter, METADATA_FILE, optimize_content};

use crate::crawler::{Heading, PageRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, instrument};

/// File format of written batches
pub const BATCH_FILE_FORMAT: &str = "jsonl";

/// A validated page record with every field resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub url: String,
    pub title: String,
    #[serde(alias = "meta_description")]
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub links: BTreeSet<String>,
    pub word_count: usize,
    pub extracted_at: DateTime<Utc>,
    /// Whether content was cut to the maximum word count
    #[serde(default)]
    pub truncated: bool,
}

/// Lifecycle state of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Created,
}

/// Summary of a single batch, derived from its records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub batch_id: String,
    pub created_at: DateTime<Utc>,
    pub url_count: usize,
    pub urls: Vec<String>,
    pub total_words: usize,
    pub average_words_per_page: usize,
    pub file_format: String,
    #[serde(alias = "processing_status")]
    pub status: BatchStatus,
}

impl BatchMetadata {
    /// Derive metadata for `records`
    pub fn for_records(batch_id: String, records: &[BatchRecord]) -> Self {
        let total_words: usize = records.iter().map(|r| r.word_count).sum();
        let url_count = records.len();

        Self {
            batch_id,
            created_at: Utc::now(),
            url_count,
            urls: records.iter().map(|r| r.url.clone()).collect(),
            total_words,
            average_words_per_page: total_words.checked_div(url_count).unwrap_or(0),
            file_format: BATCH_FILE_FORMAT.to_string(),
            status: BatchStatus::Created,
        }
    }

    /// File name the batch is written under
    pub fn file_name(&self) -> String {
        format!("batch_{}.{}", self.batch_id, self.file_format)
    }
}

/// A bounded, ordered group of records together with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub metadata: BatchMetadata,
    pub records: Vec<BatchRecord>,
}

/// Result of one batching run
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub batches: Vec<Batch>,
    pub stats: ValidationStats,
}

impl BatchRun {
    /// Metadata of every batch, in batch order
    pub fn metadata(&self) -> Vec<BatchMetadata> {
        self.batches.iter().map(|b| b.metadata.clone()).collect()
    }

    /// Total number of records across all batches
    pub fn record_count(&self) -> usize {
        self.batches.iter().map(|b| b.records.len()).sum()
    }
}

/// Split `records` into contiguous chunks of at most `batch_size`
///
/// Chunk `i` holds records `[i * batch_size, min((i + 1) * batch_size, n))`.
pub fn partition<T>(records: Vec<T>, batch_size: usize) -> Result<Vec<Vec<T>>, BatchError> {
    if batch_size == 0 {
        return Err(BatchError::Validation(
            "batch size must be greater than zero".to_string(),
        ));
    }

    let mut chunks = Vec::with_capacity(records.len().div_ceil(batch_size));
    let mut records = records.into_iter().peekable();
    while records.peek().is_some() {
        chunks.push(records.by_ref().take(batch_size).collect());
    }
    Ok(chunks)
}

/// Validates records and groups them into batches
#[derive(Debug, Clone, Default)]
pub struct Batcher {
    config: BatchConfig,
}

impl Batcher {
    /// Create a batcher from its configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Validate `records` and partition the survivors into batches
    ///
    /// Fails with [`BatchError::Validation`] when no record survives cleaning.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn process(&self, records: Vec<PageRecord>) -> Result<BatchRun, BatchError> {
        let (cleaned, stats) = validate(records, &self.config);
        if cleaned.is_empty() {
            return Err(BatchError::Validation(
                "no valid records to batch".to_string(),
            ));
        }

        let chunks = partition(cleaned, self.config.batch_size)?;
        let run_id = Utc::now().timestamp_millis();
        let total = chunks.len();

        let batches = chunks
            .into_iter()
            .enumerate()
            .map(|(i, records)| {
                let batch_id = format!("{}_{:03}", run_id, i + 1);
                info!("Batch {}/{} created: {} URLs", i + 1, total, records.len());
                Batch {
                    metadata: BatchMetadata::for_records(batch_id, &records),
                    records,
                }
            })
            .collect();

        Ok(BatchRun { batches, stats })
    }

    /// Write a run to the configured output directory
    pub fn write(&self, run: &BatchRun) -> Result<BatchSummary, BatchError> {
        BatchWriter::new(&self.config.output_dir, self.config.optimize_content).write(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(i: usize, words: usize) -> PageRecord {
        PageRecord {
            url: format!("https://example.com/page-{}", i),
            title: format!("Page {}", i),
            description: String::new(),
            content: vec!["word"; words].join(" "),
            headings: Vec::new(),
            links: BTreeSet::new(),
            word_count: words,
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn test_partition_sizes() {
        let chunks = partition((0..120).collect(), 50).unwrap();
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![50, 50, 20]);

        let flattened: Vec<i32> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, (0..120).collect::<Vec<_>>());
    }

    #[test]
    fn test_partition_edge_cases() {
        assert!(partition(Vec::<u8>::new(), 5).unwrap().is_empty());
        assert_eq!(partition(vec![1, 2, 3], 3).unwrap(), vec![vec![1, 2, 3]]);
        assert_eq!(partition(vec![1, 2], 10).unwrap(), vec![vec![1, 2]]);
        assert!(matches!(
            partition(vec![1], 0),
            Err(BatchError::Validation(_))
        ));
    }

    #[test]
    fn test_partition_ceil_count() {
        for n in [1usize, 7, 49, 50, 51, 99, 100, 101] {
            for b in [1usize, 3, 50] {
                let chunks = partition((0..n).collect(), b).unwrap();
                assert_eq!(chunks.len(), n.div_ceil(b));
                assert!(chunks[..chunks.len() - 1].iter().all(|c| c.len() == b));
            }
        }
    }

    #[test]
    fn test_process_120_records() {
        let records: Vec<PageRecord> = (0..120).map(|i| page(i, 10 + i % 7)).collect();
        let expected_urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();

        let run = Batcher::default().process(records).unwrap();

        let sizes: Vec<usize> = run.batches.iter().map(|b| b.records.len()).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
        assert_eq!(run.record_count(), 120);

        for batch in &run.batches {
            let meta = &batch.metadata;
            assert_eq!(meta.url_count, batch.records.len());
            assert_eq!(
                meta.total_words,
                batch.records.iter().map(|r| r.word_count).sum::<usize>()
            );
            assert_eq!(meta.average_words_per_page, meta.total_words / meta.url_count);
            assert_eq!(meta.status, BatchStatus::Created);
            assert_eq!(meta.file_format, "jsonl");
        }

        let urls: Vec<String> = run
            .batches
            .iter()
            .flat_map(|b| b.records.iter().map(|r| r.url.clone()))
            .collect();
        assert_eq!(urls, expected_urls);

        let ids: BTreeSet<String> = run.metadata().into_iter().map(|m| m.batch_id).collect();
        assert_eq!(ids.len(), 3);
        assert!(run.batches[0].metadata.batch_id.ends_with("_001"));
        assert!(run.batches[2].metadata.batch_id.ends_with("_003"));
    }

    #[test]
    fn test_process_rejects_empty_corpus() {
        let records = vec![page(0, 5), page(1, 3)];
        let result = Batcher::default().process(records);
        assert!(matches!(result, Err(BatchError::Validation(_))));

        assert!(matches!(
            Batcher::default().process(Vec::new()),
            Err(BatchError::Validation(_))
        ));
    }

    #[test]
    fn test_metadata_serialization() {
        let run = Batcher::default().process(vec![page(0, 12)]).unwrap();
        let json = serde_json::to_value(&run.batches[0].metadata).unwrap();

        assert_eq!(json["status"], "created");
        assert_eq!(json["url_count"], 1);
        assert_eq!(json["average_words_per_page"], 12);
        assert!(run.batches[0].metadata.file_name().ends_with(".jsonl"));
    }
}
