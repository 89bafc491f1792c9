//! HTTP client trait and implementations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;

use super::cache::DiskCache;
use super::rate_limiter::RateLimiter;

/// Trait for HTTP clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL and return the body as text.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Configuration for CachingClient.
#[derive(Clone)]
pub struct CachingClientBuilder {
    cache_dir: Option<PathBuf>,
    max_age: Option<Duration>,
    rate_limit_ms: u64,
    never_network: bool,
    timeout: Duration,
    user_agent: String,
}

impl Default for CachingClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CachingClientBuilder {
    /// Create a new builder with default settings: no cache, 200ms between
    /// requests to the same host, 10s timeout.
    pub fn new() -> Self {
        Self {
            cache_dir: None,
            max_age: None,
            rate_limit_ms: 200,
            never_network: false,
            timeout: Duration::from_secs(10),
            user_agent: concat!("dinner-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the cache directory. None disables caching.
    pub fn cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cache_dir = dir;
        self
    }

    /// Expire cached entries after `max_age`.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Set the rate limit delay in milliseconds. 0 disables rate limiting.
    pub fn rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    /// Set never-network mode. When true, returns an error if content is not cached.
    pub fn never_network(mut self, never: bool) -> Self {
        self.never_network = never;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build the CachingClient.
    pub fn build(self) -> Result<CachingClient, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        let cache = self.cache_dir.map(|dir| {
            let cache = DiskCache::new(dir);
            match self.max_age {
                Some(max_age) => cache.with_max_age(max_age),
                None => cache,
            }
        });

        Ok(CachingClient {
            inner: Arc::new(inner),
            cache,
            rate_limiter: RateLimiter::new(Duration::from_millis(self.rate_limit_ms)),
            never_network: self.never_network,
        })
    }
}

/// Production HTTP client with caching and per-host rate limiting.
pub struct CachingClient {
    /// Shared reqwest client for connection pooling.
    inner: Arc<reqwest::Client>,
    /// Optional disk cache.
    cache: Option<DiskCache>,
    /// Per-host rate limiter.
    rate_limiter: RateLimiter,
    /// When true, never access network - return error if not cached.
    never_network: bool,
}

impl CachingClient {
    /// Get a builder for custom configuration.
    pub fn builder() -> CachingClientBuilder {
        CachingClientBuilder::new()
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> Option<super::cache::CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    /// Check if a URL is cached.
    pub fn is_cached(&self, url: &str) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|c| c.get(url).is_some())
    }

    async fn fetch_with_cache(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(url)) {
            tracing::debug!(url = %cached.url, "cache hit");
            return Ok(cached.body);
        }

        if self.never_network {
            return Err(FetchError::OfflineMiss(parsed.path().to_string()));
        }

        if let Some(host) = parsed.host_str() {
            self.rate_limiter.wait(host).await;
        }

        tracing::debug!(host = parsed.host_str(), path = parsed.path(), "network: fetching");
        let response = self.inner.get(parsed.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(path = parsed.path(), status = %status, "network: request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: parsed.path().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| FetchError::InvalidEncoding(format!("Invalid UTF-8 in response: {}", e)))?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url, &body, content_type) {
                tracing::warn!(error = %e, "Failed to cache HTTP response");
            }
        }

        Ok(body)
    }
}

#[async_trait]
impl HttpClient for CachingClient {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_with_cache(url).await
    }
}

/// Mock response for testing.
#[derive(Clone)]
pub enum MockResponse {
    Text(String),
    Error(String),
}

/// Mock HTTP client for testing. Matches on the full URL, then on the URL
/// with its query string stripped.
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
}

impl MockClient {
    /// Create a new empty mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for a URL.
    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    /// Add a text response for a URL.
    pub fn with_text(self, url: &str, body: &str) -> Self {
        self.with_response(url, MockResponse::Text(body.to_string()))
    }

    /// Add an error response for a URL.
    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(url, MockResponse::Error(error.to_string()))
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .responses
            .get(url)
            .or_else(|| self.responses.get(url.split('?').next().unwrap_or(url)));

        match response {
            Some(MockResponse::Text(body)) => Ok(body.clone()),
            Some(MockResponse::Error(e)) => Err(FetchError::InvalidUrl(e.clone())),
            None => Err(FetchError::InvalidUrl(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_client_prefers_exact_match() {
        let client = MockClient::new()
            .with_text("https://api.example.com/search", "any query")
            .with_text("https://api.example.com/search?query=soup", "soup only");

        assert_eq!(
            client
                .fetch_text("https://api.example.com/search?query=soup")
                .await
                .unwrap(),
            "soup only"
        );
        assert_eq!(
            client
                .fetch_text("https://api.example.com/search?query=stew")
                .await
                .unwrap(),
            "any query"
        );
        assert!(client.fetch_text("https://other.example.com/").await.is_err());
    }

    #[tokio::test]
    async fn offline_client_serves_cache_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let client = CachingClient::builder()
            .cache_dir(Some(dir.path().to_path_buf()))
            .never_network(true)
            .build()
            .unwrap();
        let url = "https://api.example.com/search?query=soup&apiKey=k";

        assert!(matches!(
            client.fetch_text(url).await,
            Err(FetchError::OfflineMiss(_))
        ));

        DiskCache::new(dir.path().to_path_buf())
            .put(url, "cached body", None)
            .unwrap();
        assert!(client.is_cached(url));
        assert_eq!(client.fetch_text(url).await.unwrap(), "cached body");
        assert_eq!(client.cache_stats().unwrap().cached_responses, 1);
    }
}
