//! sw_fetch tool implementation.
//!
//! Runs one request through the worker as if a controlled client issued it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stash_core::{FetchOutcome, Request, RequestMode, Worker};

use crate::error::ToolError;
use crate::tools::{ResponseView, json_result};

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute request URL.
    pub url: String,

    /// Request mode: "navigate", "same-origin", "no-cors" (default) or "cors".
    #[serde(default)]
    pub mode: RequestMode,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwFetchOutput {
    /// The worker did not intercept; the caller should go to the network.
    Passthrough,
    Response(ResponseView),
    NoResponse,
}

impl From<&FetchOutcome> for SwFetchOutput {
    fn from(outcome: &FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Passthrough => SwFetchOutput::Passthrough,
            FetchOutcome::Response(response) => SwFetchOutput::Response(ResponseView::from(response)),
            FetchOutcome::NoResponse => SwFetchOutput::NoResponse,
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let mut request = Request::parse(&params.url, params.mode)?;
    if let Some(method) = params.method.filter(|m| !m.trim().is_empty()) {
        request = request.with_method(method);
    }

    let outcome = worker.handle_fetch(request).await;
    Ok(json_result(&SwFetchOutput::from(&outcome))?)
}
