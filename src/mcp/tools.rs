//! MCP tool listing and dispatch onto an [`AnalyticsBackend`].

use serde_json::Value;
use tracing::{debug, error};

use super::types::{ToolDefinition, ToolsCallResult};
use crate::analytics::ToolKind;
use crate::backend::AnalyticsBackend;

/// Every tool with its JSON schema.
pub fn list_tools() -> Vec<ToolDefinition> {
    ToolKind::ALL.into_iter().map(ToolDefinition::from).collect()
}

/// Run `name` and wrap the outcome as an MCP tool result.
///
/// Failures never surface as JSON-RPC errors; the client gets an
/// `isError` result with an `{"error": ...}` body instead.
pub async fn call_tool(
    backend: &dyn AnalyticsBackend,
    name: &str,
    arguments: &Value,
) -> ToolsCallResult {
    debug!(tool = %name, "calling tool");
    match backend.call(name, arguments).await {
        Ok(value) => ToolsCallResult::json(&value),
        Err(e) => {
            error!(tool = %name, error = %e, "tool call failed");
            ToolsCallResult::error(e)
        }
    }
}
