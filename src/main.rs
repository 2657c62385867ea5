//! # sitelens CLI Application
//!
//! This module implements the command-line interface for sitelens, exposing
//! each pipeline stage as a subcommand.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Subcommands for the pipeline stages:
//!   - `crawl`: URL discovery and content extraction
//!   - `batch`: validation and batching of extracted records
//!   - `analyze`: relevance scoring of written batches
//!   - `run`: every stage end to end
//!
//! ## Features
//!
//! - Progress tracking while pages are extracted
//! - Optional log file next to console logging
//! - Telemetry integration for monitoring
//! - Gemini embeddings when `GEMINI_API_KEY` is set, a local model otherwise

mod telemetry;

use anyhow::{Context, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rig::embeddings::EmbeddingModel;
use sitelens::batcher::{BatchConfig, BatchSummary, Batcher};
use sitelens::crawler::storage::{self, Storage, StorageConfig};
use sitelens::crawler::{ContentExtractor, Crawler, CrawlerConfig, Fetcher, PageRecord};
use sitelens::index::{BlobStore, DocumentIndex, LocalBlobStore, MemoryIndex, TracingNotifier};
use sitelens::model::{HashingEmbedder, gemini_embedding_from_env};
use sitelens::pipeline::{Pipeline, PipelineConfig};
use sitelens::scorer::{RelevanceAnalysis, RelevanceScorer, ScorerConfig, save_analysis};
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "Crawl a website, batch its content and score its relevance", long_about = None)]
struct Cli {
    /// Also write logs to sitelens.log in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover and extract the pages of a website
    Crawl(CrawlArgs),

    /// Validate extracted records and write them as batches
    Batch(BatchArgs),

    /// Score written batches against target keywords
    Analyze(AnalyzeArgs),

    /// Crawl, batch, import and analyze in one go
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// URL to start from
    #[arg(required = true)]
    url: String,

    /// Maximum number of pages to discover
    #[arg(short = 'p', long, default_value = "100")]
    max_pages: usize,

    /// Delay after every request in milliseconds
    #[arg(short, long, default_value = "1000")]
    rate: u64,

    /// Directory the raw data file is written to
    #[arg(short, long, default_value = "data/raw")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Raw data file written by `crawl`
    #[arg(required = true)]
    input: PathBuf,

    /// Directory batch files are written to
    #[arg(short, long, default_value = "data/batches")]
    output_dir: PathBuf,

    /// Maximum number of records per batch
    #[arg(short, long, default_value = "50")]
    batch_size: usize,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Directory holding batch files written by `batch`
    #[arg(short, long, default_value = "data/batches")]
    batches: PathBuf,

    /// Search query
    #[arg(short, long)]
    query: String,

    /// Target keywords (default: the query)
    #[arg(short, long, num_args = 1..)]
    keywords: Vec<String>,

    /// Maximum number of search results scored
    #[arg(short, long, default_value = "10")]
    limit: usize,

    /// Directory analysis files are written to
    #[arg(short, long, default_value = "data/processed")]
    output_dir: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// URL to start from
    #[arg(required = true)]
    url: String,

    /// Search query
    #[arg(short, long)]
    query: String,

    /// Target keywords (default: the query)
    #[arg(short, long, num_args = 1..)]
    keywords: Vec<String>,

    /// Maximum number of pages to discover
    #[arg(short = 'p', long, default_value = "100")]
    max_pages: usize,

    /// Delay after every request in milliseconds
    #[arg(short, long, default_value = "1000")]
    rate: u64,

    /// Directory all output is written below
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _otel = telemetry::init_tracing_subscriber(cli.log_dir.as_deref())?;

    match cli.command {
        Some(Commands::Crawl(args)) => crawl_command(args).await?,
        Some(Commands::Batch(args)) => batch_command(args).await?,
        Some(Commands::Analyze(args)) => match gemini_embedding_from_env() {
            Some(embedder) => analyze_command(args, embedder).await?,
            None => analyze_command(args, HashingEmbedder::default()).await?,
        },
        Some(Commands::Run(args)) => match gemini_embedding_from_env() {
            Some(embedder) => run_command(args, embedder).await?,
            None => run_command(args, HashingEmbedder::default()).await?,
        },
        None => Cli::command().print_help()?,
    }

    Ok(())
}

fn keywords_or_query(keywords: &[String], query: &str) -> Vec<String> {
    if keywords.is_empty() {
        vec![query.to_string()]
    } else {
        keywords.to_vec()
    }
}

fn progress_bar(len: usize) -> anyhow::Result<ProgressBar> {
    let progress_bar = ProgressBar::new(len as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Extracting pages...");
    Ok(progress_bar)
}

/// Extract `urls` while advancing a progress bar
async fn extract_with_progress(
    extractor: &ContentExtractor,
    urls: &[String],
) -> anyhow::Result<Vec<PageRecord>> {
    let progress_bar = progress_bar(urls.len())?;
    let records = extractor
        .extract_all(urls, |_, url| {
            progress_bar.inc(1);
            progress_bar.set_message(url.to_string());
        })
        .await;
    progress_bar.finish_with_message(format!("Extracted {} pages", records.len()));
    Ok(records)
}

fn print_crawl_summary(records: &[PageRecord], raw_file: &Path) {
    let total_words: usize = records.iter().map(|r| r.word_count).sum();
    let average = total_words.checked_div(records.len()).unwrap_or(0);

    println!("\nExtraction complete");
    println!("Pages processed: {}", records.len());
    println!("Output file: {}", raw_file.display());
    println!("Total words: {}", total_words);
    println!("Average page length: {} words", average);
}

fn print_batch_summary(summary: &BatchSummary) {
    println!("\nBatch processing complete");
    println!("Pages processed: {}", summary.total_pages_processed);
    println!("Batches created: {}", summary.total_batches_created);
    println!(
        "Average batch size: {:.1} pages",
        summary.average_pages_per_batch
    );
    println!("Metadata file: {}", summary.metadata_file.display());
}

fn print_analysis(analysis: &RelevanceAnalysis, analysis_file: &Path) {
    println!("\nANALYSIS RESULTS");
    println!("{}", "=".repeat(40));
    println!("Composite score: {:.1}%", analysis.composite_score * 100.0);
    println!(
        "Content quality: {:.1}%",
        analysis.content_quality_score * 100.0
    );
    println!(
        "Keyword relevance: {:.1}%",
        analysis.keyword_relevance_score * 100.0
    );
    println!("Documents found: {}", analysis.total_documents);

    println!("\nTop recommendations:");
    for (i, rec) in analysis.recommendations.iter().take(3).enumerate() {
        println!("  {}. {}", i + 1, rec);
    }

    println!("\nDetailed analysis: {}", analysis_file.display());
    println!(
        "Text report: {}_report.txt",
        analysis_file.with_extension("").display()
    );
}

#[instrument]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    println!("Crawling {} (up to {} pages)...", args.url, args.max_pages);

    let config = CrawlerConfig::builder()
        .max_pages(args.max_pages)
        .rate_limit_ms(args.rate)
        .build();
    let fetcher = Fetcher::new(&config)?;
    let crawler = Crawler::with_fetcher(&config, fetcher.clone())?;
    let extractor = ContentExtractor::with_fetcher(config, fetcher);

    let urls = crawler.discover(&args.url, args.max_pages).await?;
    println!("Discovered {} URLs", urls.len());

    let records = extract_with_progress(&extractor, &urls).await?;

    let storage = Storage::with_config(StorageConfig {
        base_path: args.output,
    });
    let raw_file = storage.save(&records).await?;

    print_crawl_summary(&records, &raw_file);
    Ok(())
}

#[instrument]
async fn batch_command(args: BatchArgs) -> anyhow::Result<()> {
    let records = storage::load(&args.input)
        .await
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    println!("Loaded {} records", records.len());

    let batcher = Batcher::new(
        BatchConfig::builder()
            .batch_size(args.batch_size)
            .output_dir(args.output_dir)
            .build(),
    );
    let run = batcher.process(records)?;
    let summary = batcher.write(&run)?;

    print_batch_summary(&summary);
    Ok(())
}

#[instrument(skip(embedder))]
async fn analyze_command<E: EmbeddingModel>(
    args: AnalyzeArgs,
    embedder: E,
) -> anyhow::Result<()> {
    let store = LocalBlobStore::new(&args.batches);
    let index = MemoryIndex::new(store.clone());

    let mut batch_files: Vec<String> = std::fs::read_dir(&args.batches)
        .with_context(|| format!("Failed to read {}", args.batches.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("batch_") && name.ends_with(".jsonl"))
        .collect();
    batch_files.sort();
    if batch_files.is_empty() {
        bail!("No batch files found in {}", args.batches.display());
    }

    for name in &batch_files {
        let status = index.import(&store.locate(name)).await?;
        println!("Imported {} documents from {}", status.documents, name);
    }

    println!("\nSearching for '{}'...", args.query);
    let keywords = keywords_or_query(&args.keywords, &args.query);
    let results = index.search(&args.query, &keywords, args.limit).await?;

    let scorer = RelevanceScorer::new(embedder, ScorerConfig::default());
    let analysis = scorer.score(&results, &keywords).await;
    let analysis_file = save_analysis(&args.output_dir, &analysis, &results).await?;

    print_analysis(&analysis, &analysis_file);
    Ok(())
}

#[instrument(skip(embedder))]
async fn run_command<E: EmbeddingModel>(args: RunArgs, embedder: E) -> anyhow::Result<()> {
    let mut config = PipelineConfig::default().with_data_dir(&args.data_dir);
    config.crawler = CrawlerConfig::builder()
        .max_pages(args.max_pages)
        .rate_limit_ms(args.rate)
        .build();

    let blobs = args.data_dir.join("blobs");
    let pipeline = Pipeline::new(
        config,
        LocalBlobStore::new(&blobs),
        MemoryIndex::new(LocalBlobStore::new(&blobs)),
        TracingNotifier,
        embedder,
    )?;
    let keywords = keywords_or_query(&args.keywords, &args.query);

    println!("STEP 1: Website extraction");
    println!("Target URL: {}", args.url);
    println!("Maximum pages: {}", args.max_pages);
    let urls = pipeline.discover(&args.url).await?;
    println!("Discovered {} URLs", urls.len());
    let records = extract_with_progress(pipeline.extractor(), &urls).await?;
    let raw_file = pipeline.save_raw(&records).await?;
    print_crawl_summary(&records, &raw_file);

    println!("\nSTEP 2: Batch processing");
    let summary = pipeline.batch(&raw_file).await?;
    print_batch_summary(&summary);

    println!("\nSTEP 3: Import");
    let imports = pipeline.import(&summary).await?;
    let documents: usize = imports.iter().map(|s| s.documents).sum();
    println!("Imported {} documents from {} batches", documents, imports.len());

    println!("\nSTEP 4: Relevance analysis");
    println!("Query: {}", args.query);
    println!("Target keywords: {}", keywords.join(", "));
    let analysis = pipeline.analyze(&args.query, &keywords).await?;

    print_analysis(&analysis.analysis, &analysis.analysis_file);
    Ok(())
}
