//! HTTP transport for the worker.
//!
//! ### Failure model
//! - Connection, TLS, and body-read errors are `Error::Network`.
//! - Client timeouts are `Error::FetchTimeout`.
//! - Bodies over `max_bytes` are `Error::FetchTooLarge`.
//! - Any HTTP status, 4xx and 5xx included, is a successful fetch.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)

use bytes::Bytes;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use stash_core::{AppConfig, Error, Network, Request, RequestMode, Response};

/// Accept header sent with navigation requests.
const NAVIGATE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "stash/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "stash/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

pub(crate) fn map_send_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(err.to_string())
    } else {
        Error::Network(err.to_string())
    }
}

/// reqwest-backed [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Declared lengths beyond `usize` saturate instead of wrapping.
    fn check_content_length(&self, len: u64) -> Result<(), Error> {
        self.check_size(usize::try_from(len).unwrap_or(usize::MAX))
    }

    fn check_size(&self, len: usize) -> Result<(), Error> {
        if len > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }
        Ok(())
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let method = Method::from_bytes(request.method().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("bad method {}: {}", request.method(), e)))?;

        let mut builder = self.http.request(method, request.url().clone());
        if request.mode() == RequestMode::Navigate {
            builder = builder.header(header::ACCEPT, NAVIGATE_ACCEPT);
        }

        let response = builder.send().await.map_err(map_send_error)?;

        let status = response.status();

        if let Some(len) = response.content_length() {
            self.check_content_length(len)?;
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let bytes: Bytes = response.bytes().await.map_err(map_send_error)?;
        self.check_size(bytes.len())?;

        tracing::debug!(
            url = %request.url(),
            status = status.as_u16(),
            bytes = bytes.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(Response::new(status.as_u16(), headers, bytes))
    }
}
