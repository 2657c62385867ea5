//! Record cleaning and validation
//!
//! Resolves every optional field of a [`PageRecord`] so that later stages
//! only ever see fully populated [`BatchRecord`]s.

use crate::batcher::BatchRecord;
use crate::batcher::config::BatchConfig;
use crate::crawler::{PageRecord, word_count};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

/// Counters describing one validation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    /// Records received
    pub input: usize,
    /// Records kept
    pub retained: usize,
    /// Records without a URL or content
    pub dropped_missing_fields: usize,
    /// Records below the minimum word count
    pub dropped_too_short: usize,
    /// Kept records whose content was cut to the maximum word count
    pub truncated: usize,
}

/// Clean `records`, dropping the unusable ones and backfilling the rest
///
/// Input order is preserved.
pub fn validate(records: Vec<PageRecord>, config: &BatchConfig) -> (Vec<BatchRecord>, ValidationStats) {
    let mut stats = ValidationStats {
        input: records.len(),
        ..Default::default()
    };
    let mut cleaned = Vec::with_capacity(records.len());

    for record in records {
        if record.url.trim().is_empty() || record.content.trim().is_empty() {
            warn!("Skipping record with missing fields: {:?}", record.url);
            stats.dropped_missing_fields += 1;
            continue;
        }

        let words = word_count(&record.content);
        if words < config.min_word_count {
            warn!("Skipping short content: {} ({} words)", record.url, words);
            stats.dropped_too_short += 1;
            continue;
        }

        let (content, truncated) = if words > config.max_word_count {
            let content = record
                .content
                .split_whitespace()
                .take(config.max_word_count)
                .collect::<Vec<_>>()
                .join(" ");
            info!(
                "Truncated content: {} ({} -> {} words)",
                record.url, words, config.max_word_count
            );
            stats.truncated += 1;
            (content, true)
        } else {
            (record.content, false)
        };

        let title = if record.title.trim().is_empty() {
            title_from_url(&record.url)
        } else {
            record.title
        };

        let description = if record.description.trim().is_empty() {
            description_from_content(&content, config.description_chars)
        } else {
            record.description
        };

        debug!(url = %record.url, "Record validated");
        cleaned.push(BatchRecord {
            word_count: word_count(&content),
            url: record.url,
            title,
            description,
            content,
            headings: record.headings,
            links: record.links,
            extracted_at: record.extracted_at,
            truncated,
        });
    }

    stats.retained = cleaned.len();
    info!(
        "Validation finished: {} -> {} records",
        stats.input, stats.retained
    );
    (cleaned, stats)
}

/// Title derived from the last non-empty path segment, or the host
fn title_from_url(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(str::to_string)
            .or_else(|| parsed.host_str().map(str::to_string)),
        Err(_) => url
            .split('/')
            .rfind(|s| !s.is_empty())
            .map(str::to_string),
    };

    format!("Page - {}", segment.unwrap_or_default())
}

/// First `max_chars` characters of `content`, with an ellipsis when cut
fn description_from_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &content[..end]),
        None => content.to_string(),
    }
}
