//! Rate-limited page fetching shared by discovery and extraction

use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// HTTP client with an identifying user agent, a request timeout and a fixed
/// delay after every request
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    delay: Duration,
}

impl Fetcher {
    /// Create a fetcher from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            delay: config.rate_limit(),
        })
    }

    /// Fetch `url` and return its body
    ///
    /// The configured delay is applied before returning, whether the request
    /// succeeded or not.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        let result = self.get(url).await;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        result
    }

    async fn get(&self, url: &str) -> Result<String, CrawlError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Instant;

    fn config(rate_limit_ms: u64) -> CrawlerConfig {
        CrawlerConfig::builder()
            .rate_limit_ms(rate_limit_ms)
            .user_agent("sitelens-test")
            .build()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("user-agent", "sitelens-test")
            .with_status(200)
            .with_body("<html><body>hello</body></html>")
            .create_async()
            .await;

        let fetcher = Fetcher::new(&config(0)).unwrap();
        let body = fetcher
            .fetch(&format!("{}/page", server.url()))
            .await
            .unwrap();

        assert!(body.contains("hello"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = Fetcher::new(&config(0)).unwrap();
        let result = fetcher.fetch(&format!("{}/missing", server.url())).await;

        match result {
            Err(CrawlError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delay_applied_on_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/error")
            .with_status(500)
            .create_async()
            .await;

        let fetcher = Fetcher::new(&config(50)).unwrap();
        let start = Instant::now();
        let result = fetcher.fetch(&format!("{}/error", server.url())).await;

        assert!(result.is_err());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
