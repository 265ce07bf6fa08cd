//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap, HeaderValue};
use thiserror::Error;
use tracing::trace;

/// Errors raised before an HTTP status is available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    /// Connection, TLS or protocol failure.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The request was aborted after the client timeout elapsed.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// A completed HTTP exchange.
///
/// The body is a `Result` because it is read after the status line: a
/// server can answer `200 OK` and then drop the connection mid-body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed `Retry-After` header, if present and valid.
    pub retry_after: Option<Duration>,
    /// Response body, or the reason it could not be read.
    pub body: Result<Bytes, String>,
}

impl HttpResponse {
    /// Creates a response with a readable body and no `Retry-After`.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            retry_after: None,
            body: Ok(body.into()),
        }
    }

    /// Sets the `Retry-After` duration.
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Replaces the body with a read failure.
    pub fn with_body_error(mut self, reason: impl Into<String>) -> Self {
        self.body = Err(reason.into());
        self
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for asynchronous HTTP client operations.
///
/// Abstracts the single operation the fetch queue needs so tests can inject
/// scripted responses instead of talking to the network.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// Non-2xx statuses are returned as `Ok` responses; `Err` is reserved for
    /// failures where no status was received.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;
}

/// `Accept` header sent with tile requests.
pub const TILE_ACCEPT: &str = "image/webp,*/*";

/// `Accept-Language` header sent with tile requests.
pub const TILE_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Default User-Agent string for HTTP requests.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Real async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl AsyncReqwestClient {
    /// Creates a client that aborts requests after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(TILE_ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(TILE_ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// The request timeout this client was built with.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(self.timeout)
            } else {
                HttpError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_retry_after(v, Utc::now()));

        let body = response.bytes().await.map_err(|e| e.to_string());
        trace!(url, status, "HTTP response received");

        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Parses a `Retry-After` header value.
///
/// Accepts delta-seconds (`"120"`) or an HTTP-date
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`). Dates in the past yield a zero
/// duration. Returns `None` for anything else, including values too large
/// for a `Duration`.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    if let Ok(secs) = value.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).ok();
    }

    let when = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((when - now).to_std().unwrap_or(Duration::ZERO))
}
