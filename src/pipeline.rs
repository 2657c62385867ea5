//! # Pipeline Module
//!
//! Sequences the stages of a site analysis:
//!
//! 1. discover same-domain URLs from a seed
//! 2. extract every discovered page
//! 3. save the raw records to disk
//! 4. validate and batch the saved records
//! 5. upload the batch files, import them into the index and announce them
//! 6. search the index and score the results
//!
//! Stages hand off by file path or blob locator, so each one can also be run
//! on its own. A stage failure aborts the stages after it; files written by
//! earlier stages are kept.

use crate::batcher::{BatchConfig, BatchSummary, Batcher};
use crate::crawler::storage::{self, Storage, StorageConfig};
use crate::crawler::{ContentExtractor, CrawlError, Crawler, CrawlerConfig, Fetcher, PageRecord};
use crate::error::{Error, Result};
use crate::index::{BlobStore, DocumentIndex, ImportStatus, Locator, Notifier, SearchResult};
use crate::scorer::{RelevanceAnalysis, RelevanceScorer, ScorerConfig, save_analysis};
use rig::embeddings::EmbeddingModel;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Configuration of every pipeline stage
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    pub batch: BatchConfig,
    pub scorer: ScorerConfig,

    /// Blob path prefix batch files are uploaded under
    pub blob_prefix: String,

    /// Topic announcing newly imported batches
    pub notify_topic: String,

    /// Maximum number of search results scored
    pub search_limit: usize,

    /// Directory analysis files are written to
    pub analysis_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            storage: StorageConfig::default(),
            batch: BatchConfig::default(),
            scorer: ScorerConfig::default(),
            blob_prefix: "website-batches".to_string(),
            notify_topic: "batches-ready".to_string(),
            search_limit: 10,
            analysis_dir: PathBuf::from("data/processed"),
        }
    }
}

impl PipelineConfig {
    /// Place raw, batch and analysis output below `data_dir`
    pub fn with_data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        self.storage.base_path = data_dir.join("raw");
        self.batch.output_dir = data_dir.join("batches");
        self.analysis_dir = data_dir.join("processed");
        self
    }
}

/// Search results of an analysis together with their score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub results: Vec<SearchResult>,
    pub analysis: RelevanceAnalysis,
    pub analysis_file: PathBuf,
}

/// Outcome of a full pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub discovered: usize,
    pub extracted: usize,
    pub raw_file: PathBuf,
    pub batches: BatchSummary,
    pub imports: Vec<ImportStatus>,
    pub analysis: AnalysisRun,
}

/// End-to-end site analysis over pluggable index collaborators
pub struct Pipeline<B, I, N, E: EmbeddingModel> {
    config: PipelineConfig,
    crawler: Crawler,
    extractor: ContentExtractor,
    storage: Storage,
    batcher: Batcher,
    scorer: RelevanceScorer<E>,
    blob_store: B,
    index: I,
    notifier: N,
}

impl<B, I, N, E> Pipeline<B, I, N, E>
where
    B: BlobStore,
    I: DocumentIndex,
    N: Notifier,
    E: EmbeddingModel,
{
    /// Build every stage from `config`
    ///
    /// Discovery and extraction share one HTTP client, so the fetch delay
    /// applies across both.
    pub fn new(
        config: PipelineConfig,
        blob_store: B,
        index: I,
        notifier: N,
        embedder: E,
    ) -> Result<Self> {
        let fetcher = Fetcher::new(&config.crawler)?;
        let crawler = Crawler::with_fetcher(&config.crawler, fetcher.clone())?;
        let extractor = ContentExtractor::with_fetcher(config.crawler.clone(), fetcher);

        Ok(Self {
            crawler,
            extractor,
            storage: Storage::with_config(config.storage.clone()),
            batcher: Batcher::new(config.batch.clone()),
            scorer: RelevanceScorer::new(embedder, config.scorer.clone()),
            config,
            blob_store,
            index,
            notifier,
        })
    }

    /// The blob store batches are uploaded to
    pub fn blob_store(&self) -> &B {
        &self.blob_store
    }

    /// The document index batches are imported into
    pub fn index(&self) -> &I {
        &self.index
    }

    /// The extractor used for every page
    pub fn extractor(&self) -> &ContentExtractor {
        &self.extractor
    }

    /// Discover up to `max_pages` URLs reachable from `seed`
    pub async fn discover(&self, seed: &str) -> std::result::Result<Vec<String>, CrawlError> {
        self.crawler
            .discover(seed, self.config.crawler.max_pages)
            .await
    }

    /// Extract every URL, skipping pages that fail
    pub async fn extract<F>(&self, urls: &[String], on_progress: F) -> Vec<PageRecord>
    where
        F: FnMut(usize, &str),
    {
        self.extractor.extract_all(urls, on_progress).await
    }

    /// Save extracted records, returning the raw file path
    pub async fn save_raw(&self, records: &[PageRecord]) -> Result<PathBuf> {
        Ok(self.storage.save(records).await?)
    }

    /// Validate and batch the records stored in `raw_file`
    #[instrument(skip_all, fields(raw_file = %raw_file.display()))]
    pub async fn batch(&self, raw_file: &Path) -> Result<BatchSummary> {
        let records = storage::load(raw_file).await?;
        info!("Loaded {} records from {}", records.len(), raw_file.display());

        let run = self.batcher.process(records)?;
        let batcher = self.batcher.clone();
        let summary = tokio::task::spawn_blocking(move || batcher.write(&run))
            .await
            .map_err(|e| Error::Batch(format!("batch writer task failed: {}", e)))??;

        info!(
            "Created {} batches from {} pages",
            summary.total_batches_created, summary.total_pages_processed
        );
        Ok(summary)
    }

    /// Upload the batch files of `summary`, import them and announce them
    ///
    /// Files already present in the blob store are not uploaded again.
    #[instrument(skip_all, fields(batches = summary.batch_files.len()))]
    pub async fn import(&self, summary: &BatchSummary) -> Result<Vec<ImportStatus>> {
        let mut locators = Vec::with_capacity(summary.batch_files.len());
        for file in &summary.batch_files {
            locators.push(self.upload(file).await?);
        }

        let mut imports = Vec::with_capacity(locators.len());
        for locator in &locators {
            let status = self.index.import(locator).await?;
            info!("Imported {} documents from {}", status.documents, locator);
            imports.push(status);
        }

        let message = json!({
            "batch_files": locators.iter().map(Locator::as_str).collect::<Vec<_>>(),
            "total_batches": locators.len(),
            "total_pages": summary.total_pages_processed,
        });
        self.notifier
            .publish(&self.config.notify_topic, message)
            .await?;

        Ok(imports)
    }

    async fn upload(&self, file: &Path) -> Result<Locator> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Other(format!("not a file: {}", file.display())))?;
        let path = format!("{}/{}", self.config.blob_prefix.trim_end_matches('/'), name);

        let locator = self.blob_store.locate(&path);
        if self.blob_store.exists(&locator).await? {
            debug!("{} already uploaded", locator);
            return Ok(locator);
        }

        let bytes = tokio::fs::read(file).await?;
        let locator = self.blob_store.put(&path, bytes).await?;
        info!("Uploaded {} to {}", file.display(), locator);
        Ok(locator)
    }

    /// Search the index for `query` and score the results against `keywords`
    #[instrument(skip(self))]
    pub async fn analyze(&self, query: &str, keywords: &[String]) -> Result<AnalysisRun> {
        let results = self
            .index
            .search(query, keywords, self.config.search_limit)
            .await?;
        info!("Search returned {} results", results.len());

        let analysis = self.scorer.score(&results, keywords).await;
        let analysis_file = save_analysis(&self.config.analysis_dir, &analysis, &results).await?;

        Ok(AnalysisRun {
            results,
            analysis,
            analysis_file,
        })
    }

    /// Run every stage for the site at `seed`
    #[instrument(skip(self, keywords))]
    pub async fn run(&self, seed: &str, query: &str, keywords: &[String]) -> Result<PipelineReport> {
        let urls = self.discover(seed).await?;
        info!("Discovered {} URLs", urls.len());

        let records = self
            .extract(&urls, |done, url| debug!("Extracted {}/{}: {}", done, urls.len(), url))
            .await;
        info!("Extracted {} of {} pages", records.len(), urls.len());

        let raw_file = self.save_raw(&records).await?;
        let batches = self.batch(&raw_file).await?;
        let imports = self.import(&batches).await?;
        let analysis = self.analyze(query, keywords).await?;

        Ok(PipelineReport {
            discovered: urls.len(),
            extracted: records.len(),
            raw_file,
            batches,
            imports,
            analysis,
        })
    }
}
