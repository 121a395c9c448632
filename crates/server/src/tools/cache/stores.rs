//! cache_stores tool implementation.
//!
//! Lists every store with its entry count, oldest store first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stash_core::CacheDb;
use stash_core::cache::stores::StoreSummary;

use crate::tools::json_result;

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(cache: &CacheDb) -> Result<CallToolResult, McpError> {
    let stores = cache.store_summaries().await?;
    Ok(json_result(&CacheStoresOutput { stores })?)
}
