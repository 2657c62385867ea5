//! All-or-nothing batch output

use crate::batcher::error::BatchError;
use crate::batcher::{BatchRecord, BatchRun, ValidationStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, instrument, warn};

/// Name of the metadata document written next to the batches
pub const METADATA_FILE: &str = "batches_metadata.json";

/// Paragraphs shorter than this are merged into the preceding one
const MIN_PARAGRAPH_WORDS: usize = 20;

/// Outcome of writing a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_pages_processed: usize,
    pub total_batches_created: usize,
    pub batch_files: Vec<PathBuf>,
    pub metadata_file: PathBuf,
    pub processing_date: DateTime<Utc>,
    pub average_pages_per_batch: f64,
    pub validation: ValidationStats,
}

/// Writes batches as JSON Lines plus a single metadata document
#[derive(Debug, Clone)]
pub struct BatchWriter {
    dir: PathBuf,
    optimize: bool,
}

impl BatchWriter {
    /// Create a writer targeting `dir`
    pub fn new(dir: impl Into<PathBuf>, optimize: bool) -> Self {
        Self {
            dir: dir.into(),
            optimize,
        }
    }

    /// Write every batch of `run` and the metadata file
    ///
    /// Files are staged in the output directory and only renamed into place
    /// once all of them were written. If anything fails, no new file is left
    /// visible.
    #[instrument(skip_all, fields(dir = %self.dir.display(), batches = run.batches.len()))]
    pub fn write(&self, run: &BatchRun) -> Result<BatchSummary, BatchError> {
        fs::create_dir_all(&self.dir)?;

        let mut staged = Vec::with_capacity(run.batches.len() + 1);
        for batch in &run.batches {
            let file = self.stage_batch(&batch.records)?;
            staged.push((file, self.dir.join(batch.metadata.file_name())));
        }

        let mut metadata = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut metadata, &run.metadata())?;
        metadata.as_file().sync_all()?;
        let metadata_file = self.dir.join(METADATA_FILE);
        staged.push((metadata, metadata_file.clone()));

        let mut persisted: Vec<PathBuf> = Vec::with_capacity(staged.len());
        for (file, target) in staged {
            if let Err(e) = file.persist(&target) {
                // Dropping the handed-back file unlinks the staged copy
                drop(e.file);
                for path in &persisted {
                    if let Err(remove_err) = fs::remove_file(path) {
                        warn!("Failed to roll back {}: {}", path.display(), remove_err);
                    }
                }
                return Err(BatchError::Persist {
                    path: target,
                    source: e.error,
                });
            }
            persisted.push(target);
        }

        persisted.pop();
        for path in &persisted {
            info!("Batch saved: {}", path.display());
        }
        info!("Metadata saved: {}", metadata_file.display());

        let total_pages = run.record_count();
        let total_batches = run.batches.len();
        Ok(BatchSummary {
            total_pages_processed: total_pages,
            total_batches_created: total_batches,
            batch_files: persisted,
            metadata_file,
            processing_date: Utc::now(),
            average_pages_per_batch: if total_batches > 0 {
                total_pages as f64 / total_batches as f64
            } else {
                0.0
            },
            validation: run.stats,
        })
    }

    fn stage_batch(&self, records: &[BatchRecord]) -> Result<NamedTempFile, BatchError> {
        let mut file = NamedTempFile::new_in(&self.dir)?;
        {
            let mut out = BufWriter::new(file.as_file_mut());
            for record in records {
                if self.optimize {
                    let mut line = record.clone();
                    line.content = optimize_content(&record.title, &record.content);
                    serde_json::to_writer(&mut out, &line)?;
                } else {
                    serde_json::to_writer(&mut out, record)?;
                }
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
        file.as_file().sync_all()?;
        Ok(file)
    }
}

/// Prefix content with its title as a heading and merge short paragraphs
///
/// Non-empty lines are treated as paragraphs. A paragraph with fewer than 20
/// words is appended to the paragraph before it; paragraphs are joined by a
/// blank line.
pub fn optimize_content(title: &str, content: &str) -> String {
    let text = if title.is_empty() {
        content.to_string()
    } else {
        format!("# {}\n\n{}", title, content)
    };

    let mut merged: Vec<String> = Vec::new();
    for paragraph in text.lines().map(str::trim).filter(|p| !p.is_empty()) {
        match merged.last_mut() {
            Some(current) if paragraph.split_whitespace().count() < MIN_PARAGRAPH_WORDS => {
                current.push(' ');
                current.push_str(paragraph);
            }
            _ => merged.push(paragraph.to_string()),
        }
    }

    merged.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batcher::{BatchConfig, Batcher};
    use crate::crawler::PageRecord;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn page(i: usize, content: &str) -> PageRecord {
        PageRecord {
            url: format!("https://example.com/{}", i),
            title: format!("Sayfa {}", i),
            description: String::new(),
            content: content.to_string(),
            headings: Vec::new(),
            links: BTreeSet::new(),
            word_count: 0,
            extracted_at: Utc::now(),
        }
    }

    fn run(n: usize, batch_size: usize) -> BatchRun {
        let config = BatchConfig::builder().batch_size(batch_size).build();
        let records = (0..n)
            .map(|i| page(i, "türkçe içerik ile birlikte on kelimeden oluşan bir metin burada"))
            .collect();
        Batcher::new(config).process(records).unwrap()
    }

    fn lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_write_batches_and_metadata() {
        let dir = tempdir().unwrap();
        let run = run(5, 2);

        let summary = BatchWriter::new(dir.path(), false).write(&run).unwrap();

        assert_eq!(summary.total_pages_processed, 5);
        assert_eq!(summary.total_batches_created, 3);
        assert_eq!(summary.batch_files.len(), 3);
        assert!((summary.average_pages_per_batch - 5.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.metadata_file, dir.path().join(METADATA_FILE));

        let first = lines(&summary.batch_files[0]);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0]["url"], "https://example.com/0");

        let raw = fs::read_to_string(&summary.batch_files[0]).unwrap();
        assert!(raw.contains("türkçe içerik"));

        let metadata: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&summary.metadata_file).unwrap()).unwrap();
        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata[2]["url_count"], 1);
        assert_eq!(metadata[0]["file_format"], "jsonl");

        // Only final files remain, no staged leftovers
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 4);
    }

    #[test]
    fn test_write_optimizes_content() {
        let dir = tempdir().unwrap();
        let run = run(1, 50);

        let summary = BatchWriter::new(dir.path(), true).write(&run).unwrap();
        let records = lines(&summary.batch_files[0]);

        let content = records[0]["content"].as_str().unwrap();
        assert!(content.starts_with("# Sayfa 0"));
        assert_eq!(records[0]["word_count"], 10);
    }

    #[test]
    fn test_write_failure_leaves_nothing() {
        let dir = tempdir().unwrap();
        let blocked = dir.path().join("out");
        fs::write(&blocked, "not a directory").unwrap();

        let result = BatchWriter::new(&blocked, false).write(&run(3, 2));

        assert!(result.is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_persist_failure_rolls_back_batches() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(METADATA_FILE)).unwrap();

        let result = BatchWriter::new(dir.path(), false).write(&run(5, 2));

        assert!(matches!(result, Err(BatchError::Persist { .. })));
        let entries: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec![METADATA_FILE.to_string()]);
    }

    #[test]
    fn test_optimize_content_merges_short_paragraphs() {
        let long = "word ".repeat(25);
        let content = format!("{}\nshort line\n\n{}\n  tail  ", long.trim(), long.trim());

        let optimized = optimize_content("", &content);
        let paragraphs: Vec<&str> = optimized.split("\n\n").collect();

        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].ends_with("short line"));
        assert!(paragraphs[1].ends_with("tail"));
    }

    #[test]
    fn test_optimize_content_with_title() {
        assert_eq!(optimize_content("Title", "short body"), "# Title short body");

        let long = "word ".repeat(20);
        let optimized = optimize_content("Title", long.trim());
        assert_eq!(optimized, format!("# Title\n\n{}", long.trim()));
    }
}
