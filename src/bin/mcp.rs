//! Healthcare Analytics MCP server.
//!
//! Runs a JSON-RPC 2.0 server over stdio exposing the analytics tools
//! through the Model Context Protocol, querying BigQuery directly.
//!
//! Usage:
//!   healthcare-mcp [config.toml]
//!
//! Without an argument, `HEALTHCARE_MCP_CONFIG` or `healthcare-mcp.toml` is
//! used when present; environment variables (or a `.env` file) override the
//! file either way.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use healthcare_mcp::analytics::Analytics;
use healthcare_mcp::config::Config;
use healthcare_mcp::mcp::{self, LOCAL_SERVER_NAME};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing to stderr (MCP uses stdout for protocol)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("HEALTHCARE_MCP_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("healthcare-mcp.toml"));

    let config = Config::load(&config_path);
    config.validate()?;

    let analytics = Analytics::from_config(&config).context("failed to connect to BigQuery")?;
    info!(
        prefix = %config.dataset_prefix,
        "MCP server ready, waiting for JSON-RPC requests on stdin"
    );

    mcp::serve_stdio(Arc::new(analytics), LOCAL_SERVER_NAME).await?;
    Ok(())
}
