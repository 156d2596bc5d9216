use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

use super::sniff::{extract_feed_title, extract_last_post_date, is_rss_or_atom};

/// Sent with every request so site operators can identify the checker.
pub const USER_AGENT: &str = "blockchain-signals/2.0";

/// Health checks of known feeds.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(15);
/// Speculative discovery candidates; most of them miss.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
/// Pause before the single retry after an HTTP 429.
pub const RATE_LIMIT_BACKOFF: Duration = Duration::from_millis(3000);

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Why a URL did not verify as a feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// DNS, connect, TLS, redirect loop, or a body read failing midway.
    #[error("Request failed: {0}")]
    Network(String),
    #[error("Request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
    /// Non-2xx response. The body is never inspected.
    #[error("HTTP {0}")]
    HttpStatus(u16),
    /// 2xx response whose body is not RSS/Atom markup.
    #[error("Not RSS/Atom")]
    NotAFeed,
    #[error("Response too large (exceeds {0} bytes)")]
    TooLarge(usize),
}

/// Outcome of probing one URL. Built once per probe and never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyResult {
    /// Feed title from the first `<title>` element.
    pub title: Option<String>,
    /// Last-post date from `<pubDate>` / `<updated>`.
    pub last_post: Option<DateTime<Utc>>,
    /// Final HTTP status; `None` when no response was received.
    pub http_status: Option<u16>,
    pub error: Option<VerifyError>,
}

impl VerifyResult {
    fn feed(status: u16, body: &str) -> Self {
        Self {
            title: extract_feed_title(body),
            last_post: extract_last_post_date(body),
            http_status: Some(status),
            error: None,
        }
    }

    fn failed(http_status: Option<u16>, error: VerifyError) -> Self {
        Self {
            title: None,
            last_post: None,
            http_status,
            error: Some(error),
        }
    }

    /// `true` if the URL served RSS/Atom markup with a 2xx status.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_rate_limited(&self) -> bool {
        self.http_status == Some(429)
    }
}

/// Builds the HTTP client shared by every probe in a run.
///
/// Redirects are followed with reqwest's default policy (up to 10 hops).
pub fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

/// Fetches candidate URLs and decides whether they are live feeds.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct Verifier {
    client: reqwest::Client,
    timeout: Duration,
    rate_limit_backoff: Duration,
}

impl Verifier {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            rate_limit_backoff: RATE_LIMIT_BACKOFF,
        }
    }

    /// Same client, different per-request timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Issues one GET and classifies the response.
    ///
    /// Never fails: every network, status and content problem is reported
    /// through [`VerifyResult::error`]. The timeout covers the whole
    /// exchange, body included.
    pub async fn verify(&self, url: &str) -> VerifyResult {
        let result = match tokio::time::timeout(self.timeout, self.fetch(url)).await {
            Ok(result) => result,
            Err(_) => VerifyResult::failed(None, VerifyError::Timeout(self.timeout)),
        };

        match &result.error {
            None => tracing::debug!(url = %url, title = ?result.title, "Feed verified"),
            Some(e) => tracing::debug!(url = %url, status = ?result.http_status, error = %e, "Feed did not verify"),
        }
        result
    }

    /// [`verify`](Self::verify), retrying exactly once after a fixed pause
    /// if the first response is HTTP 429. A second 429 is returned as is.
    pub async fn verify_with_retry(&self, url: &str) -> VerifyResult {
        let first = self.verify(url).await;
        if !first.is_rate_limited() {
            return first;
        }

        tracing::warn!(
            url = %url,
            delay_ms = self.rate_limit_backoff.as_millis() as u64,
            "Rate limited, retrying once"
        );
        tokio::time::sleep(self.rate_limit_backoff).await;
        self.verify(url).await
    }

    async fn fetch(&self, url: &str) -> VerifyResult {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return VerifyResult::failed(None, VerifyError::Network(e.to_string())),
        };

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return VerifyResult::failed(Some(status), VerifyError::HttpStatus(status));
        }

        let body = match read_body(response, MAX_FEED_SIZE).await {
            Ok(body) => body,
            Err(e) => return VerifyResult::failed(Some(status), e),
        };

        if !is_rss_or_atom(&body) {
            return VerifyResult::failed(Some(status), VerifyError::NotAFeed);
        }
        VerifyResult::feed(status, &body)
    }

    /// GET returning the status and (size-capped) body text, for callers
    /// that inspect non-feed documents such as homepages.
    pub(crate) async fn fetch_text(
        &self,
        url: &str,
        limit: usize,
    ) -> Result<(u16, String), VerifyError> {
        let exchange = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| VerifyError::Network(e.to_string()))?;
            let status = response.status().as_u16();
            if !response.status().is_success() {
                return Err(VerifyError::HttpStatus(status));
            }
            Ok((status, read_body(response, limit).await?))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| VerifyError::Timeout(self.timeout))?
    }
}

/// Streams the response body, refusing anything over `limit` bytes.
/// Invalid UTF-8 is replaced rather than rejected.
async fn read_body(response: reqwest::Response, limit: usize) -> Result<String, VerifyError> {
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(VerifyError::TooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| VerifyError::Network(e.to_string()))?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(VerifyError::TooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
