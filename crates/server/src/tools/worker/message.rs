//! sw_message tool implementation.
//!
//! Posts a control message to the worker and returns whatever it replies.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stash_core::Worker;
use stash_core::worker::{Command, Reply};
use tokio::sync::oneshot;

use crate::tools::json_result;

/// Input parameters for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message payload, e.g. `{"type": "GET_VERSION"}`.
    pub data: Value,

    /// Attach a reply port (default: true).
    #[serde(default = "default_true")]
    pub reply: bool,
}

fn default_true() -> bool {
    true
}

/// Output structure for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    /// Whether the message type was recognized.
    pub recognized: bool,
    /// Reply posted on the port, if any.
    pub reply: Option<Reply>,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(worker: &Worker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let recognized = Command::from_message(&params.data).is_some();

    let reply = if params.reply {
        let (tx, rx) = oneshot::channel();
        worker.on_message(&params.data, Some(tx)).await;
        rx.await.ok()
    } else {
        worker.on_message(&params.data, None).await;
        None
    };

    Ok(json_result(&SwMessageOutput { recognized, reply })?)
}
