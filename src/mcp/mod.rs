//! Model Context Protocol server.
//!
//! JSON-RPC 2.0 over stdio exposing the analytics tools to AI assistants.

pub mod server;
pub mod tools;
pub mod types;

pub use server::{McpServer, BRIDGE_SERVER_NAME, LOCAL_SERVER_NAME};

use std::sync::Arc;

use crate::backend::AnalyticsBackend;
use crate::error::Result;

/// Serve MCP on this process's stdin/stdout until stdin closes.
pub async fn serve_stdio(backend: Arc<dyn AnalyticsBackend>, name: &str) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    McpServer::new(backend, name).run(stdin, stdout).await
}
