//! Retrying JSON fetcher over a pluggable HTTP transport
//!
//! Every explorer request goes through `RetryingFetcher::fetch`: up to
//! `max_attempts` tries with no delay between them, where a bad status, a
//! transport error, a timeout, or an unparseable payload all count as one
//! failed attempt. The transport is a trait so tests can script responses
//! without a live server.

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Browser-like identity expected by the explorer API
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:135.0) Gecko/20100101 Firefox/135.0";
const ACCEPT_JSON: &str = "application/json, text/plain, */*";

/// One failed attempt against the upstream API
#[derive(Debug, Clone)]
pub enum TransportError {
    Status(u16),
    Network(String),
    Parse(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Status(code) => write!(f, "unexpected status code: {}", code),
            TransportError::Network(msg) => write!(f, "network error: {}", msg),
            TransportError::Parse(msg) => write!(f, "invalid response body: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Terminal failure after all retry attempts for one request are used up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchExhausted {
    pub attempts: u32,
}

impl std::fmt::Display for FetchExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request failed after {} attempts", self.attempts)
    }
}

impl std::error::Error for FetchExhausted {}

/// HTTP GET seam between the fetcher and the outside world
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue one GET and return the response body as parsed JSON
    async fn get_json(
        &self,
        url: &str,
        referer: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, TransportError>;
}

/// Production transport backed by a shared `reqwest::Client`
///
/// The client is reused across all requests so connections are pooled, and
/// every request carries the browser-like User-Agent and Accept headers the
/// explorer expects. The Referer is per-request since it mirrors the page
/// being scraped.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_JSON));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(
        &self,
        url: &str,
        referer: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, TransportError> {
        let response = self
            .client
            .get(url)
            .header(header::REFERER, referer)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))
    }
}

/// Bounded-retry fetcher shared by both scan phases
pub struct RetryingFetcher {
    transport: Arc<dyn HttpTransport>,
    max_attempts: u32,
}

impl RetryingFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, max_attempts: u32) -> Self {
        Self {
            transport,
            max_attempts,
        }
    }

    /// Fetch a URL and deserialize its JSON body into `T`
    ///
    /// A success status with a payload that deserializes returns immediately,
    /// even if the payload is semantically empty. Everything else (bad
    /// status, transport error, timeout, undecodable or mis-shaped body)
    /// burns one attempt and retries at once, with one warning per attempt.
    /// Exhaustion is an ordinary error value; callers decide whether it is
    /// fatal.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        referer: &str,
        timeout: Duration,
    ) -> Result<T, FetchExhausted> {
        for attempt in 1..=self.max_attempts {
            match self.transport.get_json(url, referer, timeout).await {
                Ok(value) => match serde_json::from_value::<T>(value) {
                    Ok(parsed) => return Ok(parsed),
                    Err(e) => {
                        log::warn!(
                            "⚠️ {} attempt {}/{} failed: unexpected payload shape: {}",
                            url,
                            attempt,
                            self.max_attempts,
                            e
                        );
                    }
                },
                Err(e) => {
                    log::warn!(
                        "⚠️ {} attempt {}/{} failed: {}",
                        url,
                        attempt,
                        self.max_attempts,
                        e
                    );
                }
            }
        }

        log::error!("❌ {} failed after {} attempts", url, self.max_attempts);
        Err(FetchExhausted {
            attempts: self.max_attempts,
        })
    }
}
