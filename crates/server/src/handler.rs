//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache::{CacheMatchParams, match_impl, stores_impl};
use crate::tools::worker::{
    SwFetchParams, SwLifecycleParams, SwMessageParams, fetch_impl, lifecycle_impl, message_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use stash_core::{CacheDb, Worker};

/// The MCP server handler for the stash worker.
#[derive(Clone)]
pub struct StashServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<Worker>,
    cache: CacheDb,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl StashServer {
    /// Create a new server handler over a started (or passthrough) worker.
    pub fn new(worker: Arc<Worker>, cache: CacheDb) -> Self {
        Self { tool_router: Self::tool_router(), worker, cache }
    }

    #[tool(
        description = "Run a request through the worker. Returns the response it produced, 'passthrough' when it does not intercept, or 'no_response' when network and stores both missed."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(
        description = "Report the worker lifecycle state, or drive it: install, activate, start, skip_waiting."
    )]
    async fn sw_lifecycle(&self, params: Parameters<SwLifecycleParams>) -> Result<CallToolResult, McpError> {
        lifecycle_impl(&self.worker, params.0).await
    }

    #[tool(
        description = "Post a control message (SKIP_WAITING, GET_VERSION, CHECK_UPDATE, CLEAR_CACHES) and return the reply, if any."
    )]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache stores with entry counts, oldest first.")]
    async fn cache_stores(&self) -> Result<CallToolResult, McpError> {
        stores_impl(&self.cache).await
    }

    #[tool(description = "Look up a URL in one store, or in all stores when none is named.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&self.cache, params.0).await
    }
}

impl ServerHandler for StashServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "stash-worker".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
