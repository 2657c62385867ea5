//! Same-domain breadth-first URL discovery

use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;
use crate::crawler::fetch::Fetcher;
use crate::crawler::filter::UrlFilter;
use crate::crawler::frontier::CrawlFrontier;
use crate::crawler::authority;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Bounded, same-domain crawler
#[derive(Debug, Clone)]
pub struct Crawler {
    fetcher: Fetcher,
    filter: UrlFilter,
}

impl Crawler {
    /// Create a crawler from its configuration
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::new(&config)?;
        Self::with_fetcher(&config, fetcher)
    }

    /// Create a crawler that shares an existing fetcher
    pub fn with_fetcher(config: &CrawlerConfig, fetcher: Fetcher) -> Result<Self, CrawlError> {
        let filter = UrlFilter::new(&config.exclude_patterns)?;
        Ok(Self { fetcher, filter })
    }

    /// Discover up to `max_pages` same-domain URLs reachable from `seed`
    ///
    /// Pages that fail to load are logged and skipped. The only error is a
    /// seed URL that is not an absolute http(s) URL with a host. URLs are
    /// returned in discovery order with no duplicates.
    #[instrument(skip(self))]
    pub async fn discover(&self, seed: &str, max_pages: usize) -> Result<Vec<String>, CrawlError> {
        let seed_url = Url::parse(seed)?;
        if !matches!(seed_url.scheme(), "http" | "https") {
            return Err(CrawlError::InvalidSeed(seed.to_string()));
        }
        let seed_authority =
            authority(&seed_url).ok_or_else(|| CrawlError::InvalidSeed(seed.to_string()))?;

        info!("Starting discovery from {}", seed_url);
        let mut frontier = CrawlFrontier::new(seed_url.as_str(), max_pages);

        while let Some((id, url)) = frontier.next_url() {
            let url = url.to_string();
            let body = match self.fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    continue;
                }
            };
            frontier.mark_discovered(id);

            let Ok(page_url) = Url::parse(&url) else {
                continue;
            };
            for link in outbound_links(&page_url, &body) {
                if authority(&link).as_deref() != Some(seed_authority.as_str()) {
                    debug!(link = %link, "Ignoring off-domain link");
                    continue;
                }
                if self.filter.is_excluded(link.as_str()) {
                    continue;
                }
                if frontier.admit(link.as_str()) {
                    debug!(link = %link, "Queued");
                }
            }
        }

        let discovered = frontier.into_discovered();
        info!("Discovery finished with {} pages", discovered.len());
        Ok(discovered)
    }
}

/// Resolve every anchor of `html` against `base`, in document order
///
/// Only http(s) links are returned.
pub(crate) fn outbound_links(base: &Url, html: &str) -> Vec<Url> {
    document_links(base, &Html::parse_document(html))
}

pub(crate) fn document_links(base: &Url, document: &Html) -> Vec<Url> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|link| matches!(link.scheme(), "http" | "https"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn test_config() -> CrawlerConfig {
        CrawlerConfig::builder().rate_limit_ms(0).build()
    }

    fn page(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!("<a href=\"{}\">link</a>", href))
            .collect();
        format!("<html><body><p>Some text</p>{}</body></html>", anchors)
    }

    #[test]
    fn test_outbound_links_resolution() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        let html = page(&[
            "/about",
            "next",
            "//cdn.example.org/lib",
            "https://other.com/x",
            "mailto:team@example.com",
            "javascript:void(0)",
        ]);

        let links: Vec<String> = outbound_links(&base, &html)
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            links,
            vec![
                "https://example.com/about",
                "https://example.com/blog/next",
                "https://cdn.example.org/lib",
                "https://other.com/x",
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_same_domain_only() {
        let mut server = Server::new_async().await;
        let base = server.url();

        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(page(&[
                "/a",
                "/b",
                "https://off-domain.example/one",
                "http://another.example/two",
            ]))
            .create_async()
            .await;
        let _a = server
            .mock("GET", "/a")
            .with_status(200)
            .with_body(page(&["/", "/b"]))
            .create_async()
            .await;
        let _b = server
            .mock("GET", "/b")
            .with_status(200)
            .with_body(page(&["/a"]))
            .create_async()
            .await;

        let crawler = Crawler::new(test_config()).unwrap();
        let discovered = crawler.discover(&format!("{}/", base), 10).await.unwrap();

        assert_eq!(discovered.len(), 3);
        assert_eq!(
            discovered,
            vec![format!("{}/", base), format!("{}/a", base), format!("{}/b", base)]
        );
        let seed = Url::parse(&base).unwrap();
        for url in &discovered {
            let url = Url::parse(url).unwrap();
            assert_eq!(authority(&url), authority(&seed));
        }
    }

    #[tokio::test]
    async fn test_discover_respects_max_pages() {
        let mut server = Server::new_async().await;
        let links: Vec<String> = (0..20).map(|i| format!("/p{}", i)).collect();
        let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
        let body = page(&link_refs);

        let _pages = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let crawler = Crawler::new(test_config()).unwrap();
        let discovered = crawler
            .discover(&format!("{}/", server.url()), 5)
            .await
            .unwrap();

        assert_eq!(discovered.len(), 5);
    }

    #[tokio::test]
    async fn test_discover_skips_failures_and_exclusions() {
        let mut server = Server::new_async().await;
        let base = server.url();

        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(page(&["/broken", "/ok", "/files/Report.PDF", "/login", "/ok#top"]))
            .create_async()
            .await;
        let broken = server
            .mock("GET", "/broken")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let _ok = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body(page(&["/broken"]))
            .create_async()
            .await;
        let pdf = server
            .mock("GET", "/files/Report.PDF")
            .expect(0)
            .create_async()
            .await;

        let crawler = Crawler::new(test_config()).unwrap();
        let discovered = crawler.discover(&format!("{}/", base), 10).await.unwrap();

        assert_eq!(discovered, vec![format!("{}/", base), format!("{}/ok", base)]);
        broken.assert_async().await;
        pdf.assert_async().await;
    }

    #[tokio::test]
    async fn test_discover_invalid_seed() {
        let crawler = Crawler::new(test_config()).unwrap();

        assert!(matches!(
            crawler.discover("not a url", 10).await,
            Err(CrawlError::UrlParse(_))
        ));
        assert!(matches!(
            crawler.discover("ftp://example.com/", 10).await,
            Err(CrawlError::InvalidSeed(_))
        ));
    }

    #[tokio::test]
    async fn test_discover_unreachable_seed_is_empty() {
        let mut server = Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let crawler = Crawler::new(test_config()).unwrap();
        let discovered = crawler
            .discover(&format!("{}/", server.url()), 10)
            .await
            .unwrap();

        assert!(discovered.is_empty());
    }
}
