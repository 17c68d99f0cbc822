//! # Symmetria MCP Server
//!
//! Implements `ServerHandler` with 8 MCP tools, each forwarding one protocol
//! command to the Symmetria HTTP API.

use crate::client::SymmetriaClient;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

// =============================================================================
// MCP SERVER
// =============================================================================

/// MCP server that bridges to a Symmetria HTTP API.
#[derive(Clone)]
pub struct SymmetriaMcp {
    client: SymmetriaClient,
    tool_router: ToolRouter<Self>,
}

// =============================================================================
// TOOL PARAMETER STRUCTS
// =============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LoadLevelParams {
    #[schemars(description = "Level id, e.g. 'act1_level03' (see symmetria_map)")]
    pub level_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SwapParams {
    #[schemars(description = "First slot index (0-based)")]
    pub a: i64,
    #[schemars(description = "Second slot index (0-based)")]
    pub b: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SubmitParams {
    #[schemars(
        description = "Full crystal mapping: every crystal id (as a string key) to its image id, e.g. {\"0\": 1, \"1\": 2, \"2\": 0}"
    )]
    pub mapping: BTreeMap<String, u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PressParams {
    #[schemars(
        description = "Button path from symmetria_actions, e.g. 'hud/check' or 'map/level/act1_level01'"
    )]
    pub path: String,
}

// =============================================================================
// TOOL IMPLEMENTATIONS
// =============================================================================

#[tool_router]
impl SymmetriaMcp {
    pub fn new(client: SymmetriaClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    async fn forward(&self, cmd: &str, args: Value) -> Result<CallToolResult, McpError> {
        match self.client.command(cmd, args).await {
            Ok(record) => Ok(tool_result(&record)),
            Err(e) => Err(McpError::internal_error(format!("{e}"), None)),
        }
    }

    #[tool(description = "Get the current level, crystal arrangement and discovered symmetries")]
    async fn symmetria_state(&self) -> Result<CallToolResult, McpError> {
        self.forward("get_state", Value::Null).await
    }

    #[tool(description = "Load a level by id, discarding progress on the current one")]
    async fn symmetria_load_level(
        &self,
        params: Parameters<LoadLevelParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("load_level", json!({ "level_id": params.0.level_id }))
            .await
    }

    #[tool(description = "Swap the crystals in two slots of the current arrangement")]
    async fn symmetria_swap(
        &self,
        params: Parameters<SwapParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("swap", json!({ "a": params.0.a, "b": params.0.b }))
            .await
    }

    #[tool(description = "Submit a full crystal mapping as a candidate symmetry")]
    async fn symmetria_submit(
        &self,
        params: Parameters<SubmitParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("submit_permutation", json!({ "mapping": params.0.mapping }))
            .await
    }

    #[tool(description = "Drain pending game events (symmetries found, rejections, completions)")]
    async fn symmetria_events(&self) -> Result<CallToolResult, McpError> {
        self.forward("get_events", Value::Null).await
    }

    #[tool(description = "List the buttons and actions available on the current screen")]
    async fn symmetria_actions(&self) -> Result<CallToolResult, McpError> {
        self.forward("list_actions", Value::Null).await
    }

    #[tool(description = "Press a button by path (reset, check, back, or a level on the map)")]
    async fn symmetria_press(
        &self,
        params: Parameters<PressParams>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("press_button", json!({ "path": params.0.path }))
            .await
    }

    #[tool(description = "Get per-level progress: symmetries found, totals, completion")]
    async fn symmetria_map(&self) -> Result<CallToolResult, McpError> {
        self.forward("get_map_state", Value::Null).await
    }
}

// =============================================================================
// SERVER HANDLER
// =============================================================================

#[tool_handler]
impl ServerHandler for SymmetriaMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Symmetria crystal-graph puzzle. Load a level, then find every symmetry \
                 of its graph by swapping crystals and checking, or by submitting full \
                 mappings. A symmetry must keep every edge and every crystal color."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// =============================================================================
// RESPONSE FORMATTING
// =============================================================================

/// Turn a protocol response record into a tool result. Protocol failures are
/// tool-level errors so the model sees them as such.
fn tool_result(record: &Value) -> CallToolResult {
    let text = format_record(record);
    if record.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        CallToolResult::success(vec![Content::text(text)])
    } else {
        CallToolResult::error(vec![Content::text(text)])
    }
}

/// Human-readable rendering of a response record.
fn format_record(record: &Value) -> String {
    let mut parts = Vec::new();

    if let Some(error) = record.get("error") {
        let kind = error.get("kind").and_then(Value::as_str).unwrap_or("?");
        let message = error.get("message").and_then(Value::as_str).unwrap_or("");
        parts.push(format!("Error {kind}: {message}"));
    }

    if let Some(events) = record.get("events").and_then(Value::as_array)
        && !events.is_empty()
    {
        parts.push(format!("Events ({}):", events.len()));
        for event in events {
            parts.push(format!("  {}", format_event(event)));
        }
    }

    if let Some(data) = record.get("data") {
        parts.push(serde_json::to_string_pretty(data).unwrap_or_default());
    }

    if parts.is_empty() {
        "OK".to_string()
    } else {
        parts.join("\n")
    }
}

fn format_event(event: &Value) -> String {
    let kind = event.get("type").and_then(Value::as_str).unwrap_or("?");
    let count = |key: &str| event.get(key).and_then(Value::as_u64).unwrap_or(0);
    match kind {
        "symmetry_found" => format!(
            "symmetry found ({}/{})",
            count("found_count"),
            count("total")
        ),
        "invalid_attempt" => format!(
            "invalid attempt: {} ({})",
            event.get("reason").and_then(Value::as_str).unwrap_or("?"),
            event.get("detail").and_then(Value::as_str).unwrap_or("")
        ),
        "level_completed" => "level completed".to_string(),
        "subgroup_found" => format!("subgroup found (order {})", count("order")),
        "error" => format!(
            "error {}: {}",
            event.get("kind").and_then(Value::as_str).unwrap_or("?"),
            event.get("message").and_then(Value::as_str).unwrap_or("")
        ),
        other => other.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
