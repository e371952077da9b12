//! MCP server over stdio.
//!
//! Speaks line-delimited JSON-RPC on stdin/stdout and answers `tools/list`
//! and `tools/call` from a [`Toolbox`]. Initialization, ping and shutdown are
//! left to rmcp's defaults. Logging must never touch stdout while serving.

pub mod bridge;

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{
    handler::server::ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    ErrorData as McpError, ServiceExt,
};
use tracing::info;

use self::bridge::{arguments_to_value, output_to_call_result, schema_to_mcp_tool};
use crate::tools::Toolbox;

pub const SERVER_NAME: &str = "rundeck-mcp";

#[derive(Clone)]
pub struct RundeckMcpServer {
    toolbox: Arc<Toolbox>,
}

impl RundeckMcpServer {
    pub fn new(toolbox: Arc<Toolbox>) -> Self {
        Self { toolbox }
    }
}

impl ServerHandler for RundeckMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Tools for Rundeck: browse projects and jobs, run jobs, inspect executions, \
                 and compute execution metrics and ROI. Pass `server` to target a configured \
                 server other than the default."
                    .to_string(),
            ),
            ..ServerInfo::default()
        };
        info.server_info.name = SERVER_NAME.to_string();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            let tools = self.toolbox.schemas().into_iter().map(schema_to_mcp_tool).collect();
            Ok(ListToolsResult {
                tools,
                next_cursor: None,
                meta: None,
            })
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = arguments_to_value(request.arguments);
        let output = self.toolbox.call(&request.name, arguments).await;
        Ok(output_to_call_result(output))
    }
}

/// Serve `toolbox` on stdin/stdout until the client disconnects.
pub async fn serve_stdio(toolbox: Arc<Toolbox>) -> Result<()> {
    info!(servers = ?toolbox.registry().names(), "Starting MCP server on stdio");
    let session = RundeckMcpServer::new(toolbox)
        .serve((tokio::io::stdin(), tokio::io::stdout()))
        .await
        .map_err(|e| anyhow::anyhow!("MCP handshake failed: {e}"))?;
    let reason = session.waiting().await.context("MCP session ended abnormally")?;
    info!(?reason, "MCP client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ServerRegistry;

    fn server() -> RundeckMcpServer {
        RundeckMcpServer::new(Arc::new(Toolbox::new(Arc::new(ServerRegistry::default()))))
    }

    #[test]
    fn test_info_advertises_tools_only() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
        assert_eq!(info.server_info.name, "rundeck-mcp");
    }

    #[tokio::test]
    async fn test_call_without_servers_is_error_result() {
        let server = server();
        let out = server.toolbox.call("get_projects", arguments_to_value(None)).await;
        assert!(out.text.contains("no Rundeck clients initialized"));
        assert_eq!(output_to_call_result(out).is_error, Some(true));
    }
}
