//! cache_match tool implementation.
//!
//! Looks a URL up in one named store, or across all stores when none is given.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stash_core::{CacheDb, CacheStorage, Error, Request, RequestMode};

use crate::error::ToolError;
use crate::tools::{ResponseView, json_result};

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// Absolute request URL.
    pub url: String,

    /// Store to search. All stores, oldest first, when omitted.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub url: String,
    pub store: Option<String>,
    pub response: ResponseView,
}

/// Implementation of the cache_match tool.
pub async fn match_impl(cache: &CacheDb, params: CacheMatchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let request = Request::parse(&params.url, RequestMode::NoCors)?;

    let found = match params.store.as_deref() {
        Some(store) => cache.match_in(store, &request).await?,
        None => cache.match_any(&request).await?,
    };
    let response = found.ok_or_else(|| Error::CacheMiss(params.url.clone()))?;

    let output = CacheMatchOutput { url: params.url, store: params.store, response: ResponseView::from(&response) };
    Ok(json_result(&output)?)
}
