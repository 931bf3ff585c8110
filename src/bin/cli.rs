//! Healthcare analytics CLI.
//!
//! Usage:
//!   healthcare mcp                    # MCP server on stdio (BigQuery)
//!   healthcare serve [--port 8000]    # HTTP API
//!   healthcare bridge [--url URL]     # MCP server on stdio (forwards to HTTP API)
//!   healthcare check                  # Diagnostics
//!   healthcare tools                  # List tools
//!   healthcare run <tool> --args '{}' # Run one tool

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::info;

use healthcare_mcp::analytics::{Analytics, ToolKind};
use healthcare_mcp::backend::AnalyticsBackend;
use healthcare_mcp::bridge::BridgeClient;
use healthcare_mcp::cli::{Cli, Commands};
use healthcare_mcp::config::Config;
use healthcare_mcp::mcp::{self, BRIDGE_SERVER_NAME, LOCAL_SERVER_NAME};
use healthcare_mcp::warehouse::BigQueryClient;
use healthcare_mcp::{check, http};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries MCP traffic and command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load(&cli.config);

    match cli.command {
        Commands::Mcp => {
            config.validate()?;
            let analytics =
                Analytics::from_config(&config).context("failed to connect to BigQuery")?;
            mcp::serve_stdio(Arc::new(analytics), LOCAL_SERVER_NAME).await?;
        }

        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.http.host = host;
            }
            if let Some(port) = port {
                config.http.port = port;
            }
            config.validate()?;
            let analytics =
                Analytics::from_config(&config).context("failed to connect to BigQuery")?;
            http::serve(&config.http, Arc::new(analytics)).await?;
        }

        Commands::Bridge { url } => {
            if let Some(url) = url {
                config.bridge.url = url;
            }
            let bridge = BridgeClient::from_config(&config.bridge)?;
            info!(url = %bridge.base_url(), "bridging MCP to HTTP API");
            mcp::serve_stdio(Arc::new(bridge), BRIDGE_SERVER_NAME).await?;
        }

        Commands::Check => {
            config.validate()?;
            let client = match BigQueryClient::from_config(&config) {
                Ok(client) => client,
                Err(e) => {
                    println!("{}", check::CheckReport {
                        environment: check::environment(&config),
                        outcomes: vec![check::CheckOutcome {
                            name: "BigQuery connection".to_string(),
                            passed: false,
                            detail: e.to_string(),
                        }],
                    });
                    return Ok(ExitCode::FAILURE);
                }
            };
            let mode = client.credentials().kind();
            let analytics = Analytics::new(Arc::new(client), config.dataset_prefix.clone());
            let report = check::run(&config, &analytics, mode).await;
            println!("{}", report);
            if !report.all_passed() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Tools => {
            for tool in ToolKind::ALL {
                println!("{:<36} {}", tool.name(), tool.description());
            }
        }

        Commands::Run { tool, args } => {
            config.validate()?;
            let args: Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            let analytics =
                Analytics::from_config(&config).context("failed to connect to BigQuery")?;
            let result = analytics.call(&tool, &args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
