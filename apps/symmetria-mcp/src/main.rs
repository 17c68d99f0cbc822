//! # Symmetria MCP Server
//!
//! Entry point for the MCP (Model Context Protocol) bridge to Symmetria.
//!
//! Reads configuration from environment variables:
//! - `SYMMETRIA_URL`: Symmetria server URL (default: `http://localhost:8080`)
//! - `SYMMETRIA_API_KEY`: Optional Bearer token for authentication
//!
//! Talks MCP over stdio and forwards every tool call to `POST /command`.

mod client;
mod server;

use client::SymmetriaClient;
use rmcp::{ServiceExt, transport::stdio};
use server::SymmetriaMcp;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging to stderr only; stdout is reserved for MCP stdio transport.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let url = std::env::var("SYMMETRIA_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let api_key = std::env::var("SYMMETRIA_API_KEY").ok().filter(|k| !k.is_empty());

    let client = SymmetriaClient::new(url, api_key);
    tracing::info!("Symmetria MCP server starting, target: {}", client.base_url());

    // Not fatal: the game server may come up after the MCP client connects.
    match client.health().await {
        Ok(health) => tracing::info!("Symmetria server reachable: {}", health),
        Err(e) => tracing::warn!("Symmetria server not reachable yet: {}", e),
    }

    let mcp = SymmetriaMcp::new(client);

    let service = mcp.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("MCP serve error: {:?}", e);
    })?;

    service.waiting().await?;
    Ok(())
}
