//! MCP JSON-RPC 2.0 server: newline-delimited JSON in, one response line out.
//!
//! Tracing goes to stderr; the writer given to [`McpServer::run`] carries
//! protocol traffic only.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::tools;
use super::types::*;
use crate::backend::AnalyticsBackend;
use crate::error::Result;

pub const LOCAL_SERVER_NAME: &str = "Healthcare Analytics Server";
pub const BRIDGE_SERVER_NAME: &str = "Healthcare Analytics Bridge";

pub struct McpServer {
    backend: Arc<dyn AnalyticsBackend>,
    name: String,
}

impl McpServer {
    pub fn new(backend: Arc<dyn AnalyticsBackend>, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
        }
    }

    /// Serve requests from `reader` until EOF.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = %self.name, "MCP server starting");
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            debug!(request = %trimmed, "received request");

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.handle_request(&request).await,
                Err(e) => {
                    warn!(error = %e, "invalid JSON-RPC request");
                    Some(JsonRpcResponse::error(
                        None,
                        PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            if let Some(response) = response {
                let json = serde_json::to_string(&response)?;
                debug!(response = %json, "sending response");
                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle one request; `None` for notifications.
    pub async fn handle_request(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();

        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return None;
        }

        let outcome = match request.method.as_str() {
            "initialize" => {
                let params: InitializeParams =
                    serde_json::from_value(request.params.clone()).unwrap_or_default();
                info!(
                    client = params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
                    protocol = params.protocol_version.as_deref().unwrap_or("unspecified"),
                    "client initializing"
                );
                serde_json::to_value(InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: ServerCapabilities {
                        tools: ToolCapability {},
                    },
                    server_info: ServerInfo {
                        name: self.name.clone(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                })
            }

            "tools/list" => serde_json::to_value(ToolsListResult {
                tools: tools::list_tools(),
            }),

            "tools/call" => {
                let params: ToolsCallParams = match serde_json::from_value(request.params.clone())
                {
                    Ok(p) => p,
                    Err(e) => {
                        return Some(JsonRpcResponse::error(
                            id,
                            INVALID_PARAMS,
                            format!("Invalid params: {}", e),
                        ));
                    }
                };
                let result =
                    tools::call_tool(self.backend.as_ref(), &params.name, &params.arguments).await;
                serde_json::to_value(result)
            }

            "ping" => Ok(Value::Object(Default::default())),

            other => {
                warn!(method = %other, "unknown method");
                return Some(JsonRpcResponse::error(
                    id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", other),
                ));
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        })
    }
}
