use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const BRAVE_BASE_URL: &str = "https://api.search.brave.com";
const SEARCH_PATH: &str = "/res/v1/web/search";
/// Results requested per query.
pub const PAGE_SIZE: usize = 20;
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_RESPONSE_SIZE: usize = 2 * 1024 * 1024; // 2MB

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Network(String),
    #[error("Search API returned HTTP {0}")]
    HttpStatus(u16),
    #[error("Search request timed out")]
    Timeout,
    #[error("Search response too large (exceeds {0} bytes)")]
    TooLarge(usize),
    #[error("Could not decode search response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid search URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Insecure search base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

/// Web search used to find candidate sites.
///
/// Implementations never fail: errors are logged and produce no hits.
pub trait SearchProvider {
    fn search(&self, query: &str) -> impl std::future::Future<Output = Vec<SearchHit>> + Send;
}

/// Brave web search API client.
pub struct BraveSearch {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<SearchHit>,
}

impl BraveSearch {
    pub fn new(client: reqwest::Client, api_key: SecretString) -> Self {
        Self {
            client,
            api_key,
            base_url: BRAVE_BASE_URL.to_owned(),
            timeout: SEARCH_TIMEOUT,
        }
    }

    /// Points the client at another API host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Deadline for one whole query, body included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs one query, surfacing every failure.
    pub async fn try_search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        // The subscription token must not travel over plain HTTP
        let base = self.base_url.trim_end_matches('/');
        if !base.starts_with("https://") {
            let is_localhost =
                base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost");
            if !is_localhost {
                return Err(SearchError::InsecureBaseUrl);
            }
        }

        let url = Url::parse_with_params(
            &format!("{base}{SEARCH_PATH}"),
            &[("q", query), ("count", &PAGE_SIZE.to_string())],
        )?;

        let request = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", self.api_key.expose_secret());

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| SearchError::Network(e.to_string()))?;
            if !response.status().is_success() {
                return Err(SearchError::HttpStatus(response.status().as_u16()));
            }
            read_limited_bytes(response, MAX_RESPONSE_SIZE).await
        };

        let body = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| SearchError::Timeout)??;
        let parsed: BraveResponse = serde_json::from_slice(&body)?;
        let mut hits = parsed.web.map(|w| w.results).unwrap_or_default();
        hits.truncate(PAGE_SIZE);
        Ok(hits)
    }
}

impl SearchProvider for BraveSearch {
    async fn search(&self, query: &str) -> Vec<SearchHit> {
        match self.try_search(query).await {
            Ok(hits) => {
                tracing::debug!(query = %query, hits = hits.len(), "Search finished");
                hits
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Search failed");
                Vec::new()
            }
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, SearchError> {
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(SearchError::TooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| SearchError::Network(e.to_string()))?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(SearchError::TooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
