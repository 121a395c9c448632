//! Request/response value types and the network seam.
//!
//! A `Request` is the cache key: two requests address the same entry when their
//! URL strings are equal (query included). `Response` bodies are `Bytes`, so
//! cloning one for a store write shares the buffer instead of consuming it.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Intent mode of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page load.
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Navigate => "navigate",
            RequestMode::SameOrigin => "same-origin",
            RequestMode::NoCors => "no-cors",
            RequestMode::Cors => "cors",
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigate" => Ok(RequestMode::Navigate),
            "same-origin" => Ok(RequestMode::SameOrigin),
            "no-cors" => Ok(RequestMode::NoCors),
            "cors" => Ok(RequestMode::Cors),
            other => Err(Error::InvalidInput(format!("unknown request mode: {other}"))),
        }
    }
}

/// Immutable descriptor of an outgoing fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: Url,
    method: String,
    mode: RequestMode,
}

impl Request {
    pub fn new(url: Url, mode: RequestMode) -> Self {
        Self { url, method: "GET".to_string(), mode }
    }

    /// Subresource GET for `url`.
    pub fn get(url: Url) -> Self {
        Self::new(url, RequestMode::NoCors)
    }

    /// Top-level navigation to `url`.
    pub fn navigate(url: Url) -> Self {
        Self::new(url, RequestMode::Navigate)
    }

    /// Parse `input` as an absolute URL. Any scheme is accepted here; the
    /// classifier decides whether the request is intercepted.
    pub fn parse(input: &str, mode: RequestMode) -> Result<Self, Error> {
        let url = Url::parse(input.trim()).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))?;
        Ok(Self::new(url, mode))
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// The identity used for store lookups.
    pub fn cache_key(&self) -> &str {
        self.url.as_str()
    }

    /// Stores only hold GET entries.
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }
}

/// Immutable response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Empty-bodied response with the given status.
    pub fn empty(status: u16) -> Self {
        Self::new(status, Vec::new(), Bytes::new())
    }

    /// HTML response with status 200.
    pub fn html(body: impl Into<Bytes>) -> Self {
        Self::new(200, vec![("content-type".to_string(), "text/html; charset=utf-8".to_string())], body)
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Fetch primitive consumed by the strategies.
///
/// Implementations return `Err` only for transport-level failure; a non-2xx
/// status is an ordinary `Ok` response.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
