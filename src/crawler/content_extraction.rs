//! Content extraction functionality for the crawler module

use crate::crawler::config::CrawlerConfig;
use crate::crawler::discovery::document_links;
use crate::crawler::error::CrawlError;
use crate::crawler::fetch::Fetcher;
use crate::crawler::{Heading, PageRecord, word_count};
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};
use url::Url;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector is valid"));
static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[name]").expect("meta selector is valid"));
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("heading selector is valid")
});
static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector is valid"));

/// Fetches single pages and reduces them to [`PageRecord`]s
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    config: CrawlerConfig,
    fetcher: Fetcher,
}

impl ContentExtractor {
    /// Create an extractor from its configuration
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::new(&config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Create an extractor that shares an existing fetcher
    pub fn with_fetcher(config: CrawlerConfig, fetcher: Fetcher) -> Self {
        Self { config, fetcher }
    }

    /// Fetch and parse `url`, reporting why a page was rejected
    #[instrument(skip(self))]
    pub async fn try_extract(&self, url: &str) -> Result<PageRecord, CrawlError> {
        let html = self.fetcher.fetch(url).await?;
        parse_page(url, &html, &self.config)
    }

    /// Fetch and parse `url`, returning `None` on any failure
    pub async fn extract(&self, url: &str) -> Option<PageRecord> {
        match self.try_extract(url).await {
            Ok(record) => Some(record),
            Err(CrawlError::BelowMinimum {
                url, word_count, ..
            }) => {
                warn!("Discarding {}: only {} words", url, word_count);
                None
            }
            Err(e) => {
                warn!("Failed to extract {}: {}", url, e);
                None
            }
        }
    }

    /// Extract every URL in order, calling `on_progress` after each attempt
    #[instrument(skip_all, fields(urls = urls.len()))]
    pub async fn extract_all<F>(&self, urls: &[String], mut on_progress: F) -> Vec<PageRecord>
    where
        F: FnMut(usize, &str),
    {
        let mut records = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            if let Some(record) = self.extract(url).await {
                records.push(record);
            }
            on_progress(i + 1, url);
        }

        info!("Extracted {} of {} pages", records.len(), urls.len());
        records
    }
}

/// Reduce an HTML document to a [`PageRecord`]
///
/// Content is taken from the first element matching one of the configured
/// content selectors, falling back to `<body>`. Text inside excluded elements
/// is dropped, whitespace runs are collapsed, and the result is capped at
/// `max_content_chars` characters before the word-count gate is applied.
pub fn parse_page(url: &str, html: &str, config: &CrawlerConfig) -> Result<PageRecord, CrawlError> {
    let base = Url::parse(url)?;
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|element| collapse_whitespace(element.text()))
        .unwrap_or_default();

    let description = document
        .select(&META_SELECTOR)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    let excluded = parse_selectors(&config.exclude_selectors)
        .iter()
        .flat_map(|selector| document.select(selector).map(|e| e.id()).collect::<Vec<_>>())
        .collect::<HashSet<_>>();

    // Text under `root`, skipping nodes that sit inside an excluded element
    let visible_text = |root: ElementRef| {
        collapse_whitespace(root.descendants().filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .ancestors()
                .any(|ancestor| excluded.contains(&ancestor.id()));
            (!hidden).then_some(&**text)
        }))
    };

    let main_text = parse_selectors(&config.content_selectors)
        .iter()
        .find_map(|selector| document.select(selector).next())
        .map(visible_text)
        .filter(|text| !text.is_empty());

    let content = match main_text {
        Some(text) => text,
        None => document
            .select(&BODY_SELECTOR)
            .next()
            .map(visible_text)
            .unwrap_or_default(),
    };
    let content = truncate_chars(&content, config.max_content_chars);
    let words = word_count(&content);

    if words < config.min_word_count {
        return Err(CrawlError::BelowMinimum {
            url: url.to_string(),
            word_count: words,
            minimum: config.min_word_count,
        });
    }

    let headings = document
        .select(&HEADING_SELECTOR)
        .filter_map(|element| {
            let level = element.value().name()[1..].parse::<u8>().ok()?;
            let text = collapse_whitespace(element.text());
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect();

    let links = document_links(&base, &document)
        .into_iter()
        .map(String::from)
        .collect();

    debug!(url, words, "Parsed page");

    Ok(PageRecord {
        url: url.to_string(),
        title,
        description,
        content,
        headings,
        links,
        word_count: words,
        extracted_at: Utc::now(),
    })
}

fn parse_selectors(selectors: &[String]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!("Failed to parse selector '{}': {}", s, e);
                None
            }
        })
        .collect()
}

fn collapse_whitespace<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in pieces.flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].trim_end().to_string(),
        None => text.to_string(),
    }
}
