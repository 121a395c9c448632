//! sw_lifecycle tool implementation.
//!
//! Reports the worker's lifecycle position or drives it one step.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stash_core::Worker;
use stash_core::worker::{Activation, Installation, WorkerState};

use crate::tools::json_result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    #[default]
    Status,
    Install,
    Activate,
    /// Re-activate a warm release, or install a cold one.
    Start,
    SkipWaiting,
}

/// Input parameters for sw_lifecycle tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwLifecycleParams {
    /// "status" (default), "install", "activate", "start" or "skip_waiting".
    #[serde(default)]
    pub action: LifecycleAction,
}

/// Output structure for sw_lifecycle tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwLifecycleOutput {
    pub version: String,
    pub state: WorkerState,
    pub controlling: bool,
    pub installation: Option<Installation>,
    pub activation: Option<Activation>,
}

/// Implementation of the sw_lifecycle tool.
pub async fn lifecycle_impl(worker: &Worker, params: SwLifecycleParams) -> Result<CallToolResult, McpError> {
    let mut installation = None;
    let mut activation = None;

    match params.action {
        LifecycleAction::Status => {}
        LifecycleAction::Install => installation = Some(worker.install().await?),
        LifecycleAction::Activate => activation = Some(worker.activate().await?),
        LifecycleAction::Start => {
            worker.start().await?;
        }
        LifecycleAction::SkipWaiting => worker.skip_waiting().await?,
    }

    let output = SwLifecycleOutput {
        version: worker.versions().tag().to_string(),
        state: worker.state().await,
        controlling: worker.is_controlling().await,
        installation,
        activation,
    };
    Ok(json_result(&output)?)
}
