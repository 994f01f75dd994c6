//! Page fetching
//!
//! This module defines the [`PageFetcher`] capability used by the crawl and
//! its implementations:
//! - [`HttpFetcher`]: plain GET requests, no script execution
//! - [`SiteFetcher`]: static fetches for listings, rendered fetches for details
//!
//! Fetchers make exactly one attempt per page. Callers decide what a failure
//! means for the crawl.

use crate::config::UserAgentConfig;
use crate::crawler::renderer::Renderer;
use crate::FetchError;
use reqwest::Client;
use std::time::Duration;

/// Source of page markup
///
/// Listing pages are fetched statically. Detail pages are populated by client
/// side scripts and need [`PageFetcher::fetch_rendered`].
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    /// Fetches the markup exactly as served
    async fn fetch_static(&self, url: &str) -> Result<String, FetchError>;

    /// Fetches the markup after scripts ran and the network went idle
    async fn fetch_rendered(&self, url: &str) -> Result<String, FetchError>;

    /// Releases any resources held by the fetcher
    async fn shutdown(self)
    where
        Self: Sized,
    {
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout_secs` - Overall timeout for one request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use funding_crawler::config::UserAgentConfig;
/// use funding_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), 30).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with a single GET request
///
/// Any non-2xx status is a failure.
///
/// # Returns
///
/// * `Ok(String)` - The response body
/// * `Err(FetchError)` - Network error, timeout or unsuccessful status
pub async fn fetch_url(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|e| classify_error(url, e))?;
    tracing::info!("Successfully fetched URL: {}", url);
    Ok(body)
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Fetcher without a browser
///
/// Rendered requests fall back to static fetches, which is enough for sites
/// (and test servers) that serve detail content directly.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_static(&self, url: &str) -> Result<String, FetchError> {
        fetch_url(&self.client, url).await
    }

    async fn fetch_rendered(&self, url: &str) -> Result<String, FetchError> {
        fetch_url(&self.client, url).await
    }
}

/// Static fetches over HTTP, rendered fetches through headless Chromium
pub struct SiteFetcher {
    http: HttpFetcher,
    renderer: Renderer,
}

impl SiteFetcher {
    pub fn new(http: HttpFetcher, renderer: Renderer) -> Self {
        Self { http, renderer }
    }
}

impl PageFetcher for SiteFetcher {
    async fn fetch_static(&self, url: &str) -> Result<String, FetchError> {
        self.http.fetch_static(url).await
    }

    async fn fetch_rendered(&self, url: &str) -> Result<String, FetchError> {
        self.renderer.render(url).await
    }

    async fn shutdown(self) {
        self.renderer.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config(), 5);
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent_format() {
        assert_eq!(
            create_test_config().header_value(),
            "TestCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(build_http_client(&create_test_config(), 5).unwrap());
        let url = format!("{}/list", server.uri());

        assert_eq!(fetcher.fetch_static(&url).await.unwrap(), "<html>ok</html>");
        assert_eq!(
            fetcher.fetch_rendered(&url).await.unwrap(),
            "<html>ok</html>"
        );
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(build_http_client(&create_test_config(), 5).unwrap());
        let url = format!("{}/missing", server.uri());

        match fetcher.fetch_static(&url).await {
            Err(FetchError::Status { url: failed, status }) => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let fetcher = HttpFetcher::new(build_http_client(&create_test_config(), 5).unwrap());
        let result = fetcher.fetch_static("http://127.0.0.1:9/nothing").await;
        assert!(matches!(result, Err(FetchError::Network { .. })));
    }
}
