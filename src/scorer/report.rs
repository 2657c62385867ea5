//! Text report and on-disk persistence of a relevance analysis

use super::{RelevanceAnalysis, ScoreError};
use crate::crawler::storage::create_unique;
use crate::index::SearchResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Number of top terms listed in the text report
const REPORT_TERMS: usize = 5;

#[derive(Serialize)]
struct AnalysisFile<'a> {
    analysis: &'a RelevanceAnalysis,
    results: &'a [SearchResult],
    generated_at: DateTime<Utc>,
}

fn percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

/// Render `analysis` as a plain-text optimization report
pub fn render_report(analysis: &RelevanceAnalysis, generated_at: DateTime<Utc>) -> String {
    let mut lines = vec![
        "# RELEVANCE OPTIMIZATION REPORT".to_string(),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        "=".repeat(50),
        String::new(),
        "## OVERVIEW".to_string(),
        format!("Composite score: {}", percent(analysis.composite_score)),
        format!("Content quality: {}", percent(analysis.content_quality_score)),
        format!(
            "Keyword relevance: {}",
            percent(analysis.keyword_relevance_score)
        ),
        format!("Total documents: {}", analysis.total_documents),
        String::new(),
        "## TOP TERMS".to_string(),
    ];

    lines.extend(numbered(analysis.top_terms.iter().take(REPORT_TERMS)));
    lines.push(String::new());
    lines.push("## TOP PERFORMING CONTENT".to_string());

    for (i, content) in analysis.top_performing_content.iter().enumerate() {
        let title = or_placeholder(&content.title, "(untitled)");
        let uri = or_placeholder(&content.uri, "(no URL)");
        lines.push(format!("{}. {}", i + 1, title));
        lines.push(format!("   Similarity: {}", percent(content.similarity_score)));
        lines.push(format!("   URL: {}", uri));
        lines.push(String::new());
    }

    lines.push("## RECOMMENDATIONS".to_string());
    lines.extend(numbered(&analysis.recommendations));
    lines.push(String::new());
    lines.push("## OPTIMIZATION SUGGESTIONS".to_string());
    lines.extend(numbered(&analysis.optimization_suggestions));

    lines.join("\n")
}

fn numbered<'a>(items: impl IntoIterator<Item = &'a String>) -> impl Iterator<Item = String> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() { placeholder } else { value }
}

/// Write the analysis JSON and its text report into `dir`
///
/// Files are named `relevance_analysis_<timestamp>.json` and
/// `relevance_analysis_<timestamp>_report.txt`; a taken name gets a numeric
/// suffix. Returns the JSON path.
#[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
pub async fn save_analysis(
    dir: impl AsRef<Path>,
    analysis: &RelevanceAnalysis,
    results: &[SearchResult],
) -> Result<PathBuf, ScoreError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).await?;

    let generated_at = Utc::now();
    let stem = format!(
        "relevance_analysis_{}",
        generated_at.format("%Y%m%d_%H%M%S_%3f")
    );
    let (json_path, mut json_file) = create_unique(dir, &stem, "json").await?;
    let report_path = dir.join(format!(
        "{}_report.txt",
        json_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(stem)
    ));

    let file = AnalysisFile {
        analysis,
        results,
        generated_at,
    };
    json_file
        .write_all(serde_json::to_string_pretty(&file)?.as_bytes())
        .await?;
    json_file.flush().await?;
    fs::write(&report_path, render_report(analysis, generated_at)).await?;

    info!("Analysis saved to {}", json_path.display());
    info!("Report saved to {}", report_path.display());
    Ok(json_path)
}
