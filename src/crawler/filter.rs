//! URL exclusion filtering
//!
//! Patterns are matched case-insensitively against the full URL string and
//! the first match wins.

use crate::crawler::error::CrawlError;
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// Exclusion patterns applied to every candidate URL, in evaluation order
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    r"\.(pdf|doc|docx|xls|xlsx|ppt|pptx)$",
    r"\.(jpg|jpeg|png|gif|svg|ico)$",
    r"\.(zip|rar|tar|gz)$",
    r"\.(mp3|mp4|avi|mov|wmv)$",
    r"/admin/",
    r"/wp-admin/",
    r"/login",
    r"/register",
    r"\?.*print",
    r"#",
];

static DEFAULT_FILTER: LazyLock<UrlFilter> = LazyLock::new(UrlFilter::default);

/// Returns true if `url` matches one of the default exclusion patterns
pub fn is_excluded(url: &str) -> bool {
    DEFAULT_FILTER.is_excluded(url)
}

/// Ordered set of compiled exclusion patterns
#[derive(Debug, Clone)]
pub struct UrlFilter {
    patterns: Vec<Regex>,
}

impl UrlFilter {
    /// Build a filter from the default patterns followed by `extra_patterns`
    pub fn new<S: AsRef<str>>(extra_patterns: &[S]) -> Result<Self, CrawlError> {
        let patterns = DEFAULT_EXCLUDE_PATTERNS
            .iter()
            .copied()
            .chain(extra_patterns.iter().map(AsRef::as_ref))
            .map(|pattern| Regex::new(&format!("(?i){}", pattern)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns true on the first pattern matching `url`
    pub fn is_excluded(&self, url: &str) -> bool {
        match self.patterns.iter().find(|p| p.is_match(url)) {
            Some(pattern) => {
                trace!(url, pattern = pattern.as_str(), "URL excluded");
                true
            }
            None => false,
        }
    }

    /// Number of patterns in the filter
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the filter has no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new::<&str>(&[]).expect("default exclusion patterns are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extensions_excluded() {
        assert!(is_excluded("https://example.com/report.pdf"));
        assert!(is_excluded("https://example.com/photo.jpeg"));
        assert!(is_excluded("https://example.com/archive.tar"));
        assert!(is_excluded("https://example.com/clip.mp4"));
        assert!(is_excluded("https://example.com/slides.pptx"));
        assert!(!is_excluded("https://example.com/pdf-guide"));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            is_excluded("https://example.com/Report.PDF"),
            is_excluded("https://example.com/report.pdf")
        );
        assert!(is_excluded("https://example.com/Report.PDF"));
        assert!(is_excluded("https://example.com/ADMIN/users"));
        assert!(is_excluded("https://example.com/page?mode=PRINT"));
    }

    #[test]
    fn test_paths_and_queries() {
        assert!(is_excluded("https://example.com/admin/settings"));
        assert!(is_excluded("https://example.com/wp-admin/post.php"));
        assert!(is_excluded("https://example.com/login"));
        assert!(is_excluded("https://example.com/login?next=/"));
        assert!(is_excluded("https://example.com/register/new"));
        assert!(is_excluded("https://example.com/article?view=print"));
        assert!(is_excluded("https://example.com/about#team"));

        assert!(!is_excluded("https://example.com/"));
        assert!(!is_excluded("https://example.com/blog/post-1"));
        assert!(!is_excluded("https://example.com/search?q=shoes"));
        assert!(!is_excluded("https://example.com/administration"));
    }

    #[test]
    fn test_extra_patterns() {
        let filter = UrlFilter::new(&["/tag/"]).unwrap();
        assert_eq!(filter.len(), DEFAULT_EXCLUDE_PATTERNS.len() + 1);
        assert!(filter.is_excluded("https://example.com/TAG/rust"));
        assert!(filter.is_excluded("https://example.com/file.zip"));
        assert!(!filter.is_excluded("https://example.com/blog"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = UrlFilter::new(&["("]);
        assert!(matches!(result, Err(CrawlError::InvalidPattern(_))));
    }

    #[test]
    fn test_deterministic() {
        let url = "https://example.com/docs/Guide.Docx";
        let first = is_excluded(url);
        for _ in 0..10 {
            assert_eq!(is_excluded(url), first);
        }
    }
}
