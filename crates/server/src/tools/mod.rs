//! MCP tool implementations.
//!
//! `worker` tools drive the fetch-interception worker; `cache` tools inspect
//! the stores it writes.

pub mod cache;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stash_core::Response;

use crate::error::ToolError;

/// Wire view of a response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseView {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body as text; absent when the body is not valid UTF-8.
    pub body: Option<String>,
    pub body_bytes: usize,
}

impl From<&Response> for ResponseView {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: std::str::from_utf8(&response.body).ok().map(str::to_string),
            body_bytes: response.body.len(),
        }
    }
}

/// Encode `output` as pretty JSON tool content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, ToolError> {
    let json = serde_json::to_string_pretty(output)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
