//! rundeck-mcp -- Rundeck job automation exposed as Model Context Protocol tools.
//!
//! This crate provides the Rundeck API client, a registry of named servers,
//! execution paging, execution analytics and a job run monitor, plus the
//! tool layer and MCP stdio server built on top of them.

pub mod analysis;
pub mod client;
pub mod config;
pub mod executions;
pub mod mcp;
pub mod monitor;
pub mod registry;
pub mod tools;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::RundeckConfig;
use crate::registry::ServerRegistry;
use crate::tools::{ToolPrompts, Toolbox};

/// Build clients for every configured server and wrap them in a [`Toolbox`].
pub fn build_toolbox(config: &RundeckConfig) -> Result<Toolbox> {
    let registry = ServerRegistry::from_profiles(&config.servers)
        .context("failed to initialize Rundeck clients")?;
    let prompts = config
        .tools
        .prompts_file
        .as_deref()
        .map(ToolPrompts::load)
        .unwrap_or_default();
    Ok(Toolbox::new(Arc::new(registry))
        .with_monitor(&config.monitor)
        .with_roi(config.roi.clone())
        .with_prompts(prompts))
}

/// Start the MCP server on stdio and run until the client disconnects.
pub async fn serve(config: RundeckConfig) -> Result<()> {
    // 1. Initialize clients
    let toolbox = build_toolbox(&config)?;
    tracing::info!(servers = toolbox.registry().len(), "Rundeck MCP server initialized");

    // 2. Serve until stdin closes
    mcp::serve_stdio(Arc::new(toolbox)).await
}
