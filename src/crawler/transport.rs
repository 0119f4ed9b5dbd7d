//! HTTP transport
//!
//! This module provides the fetch capability the crawler depends on:
//! - A `Transport` trait so the engine can run against any fetch backend
//! - A reqwest-backed implementation built from the crawler configuration
//! - Error classification into non-fatal `TransportError` values
//!
//! Success is exactly HTTP 200. Every other status, and every network
//! failure, is reported as a `TransportError` that callers treat as
//! "nothing found" for that URL.

use crate::config::{CrawlerConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Maximum redirect hops followed by GET requests
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code (always 200 for pages returned by `fetch`)
    pub status: u16,

    /// Content-Type header value, empty if absent
    pub content_type: String,

    /// Response body
    pub body: String,
}

impl FetchedPage {
    /// Returns true if the Content-Type marks the body as XML
    pub fn is_xml(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("xml")
    }
}

/// Errors that can occur while fetching a URL
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

/// Fetch capability used by the sitemap resolver and the frontier engine
#[async_trait]
pub trait Transport: Send + Sync {
    /// GETs a URL, succeeding only on HTTP 200
    async fn fetch(&self, url: &str) -> Result<FetchedPage, TransportError>;

    /// Sends a HEAD request and returns the status code
    async fn fetch_head(&self, url: &str) -> Result<u16, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Client used for GET requests (follows redirects)
    client: Client,

    /// Client used for HEAD requests (does not follow redirects)
    head_client: Client,
}

impl HttpTransport {
    /// Builds the transport from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpTransport)` - Successfully built clients
    /// * `Err(reqwest::Error)` - Failed to build a client
    pub fn new(crawler: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(crawler, user_agent, Policy::limited(MAX_REDIRECTS))?;
        let head_client = build_http_client(crawler, user_agent, Policy::none())?;
        Ok(Self {
            client,
            head_client,
        })
    }
}

/// Builds an HTTP client with the configured user agent and timeouts
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
    redirect: Policy,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .redirect(redirect)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a reqwest error onto a transport error
fn classify_error(url: &str, e: reqwest::Error) -> TransportError {
    let message = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    };

    TransportError::Network {
        url: url.to_string(),
        message,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.text().await.map_err(|e| TransportError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(FetchedPage {
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    async fn fetch_head(&self, url: &str) -> Result<u16, TransportError> {
        let response = self
            .head_client
            .head(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;
        Ok(response.status().as_u16())
    }
}
