//! Command-line interface for the `healthcare` binary.
//!
//! Commands:
//! - Serving: mcp, serve, bridge
//! - Operations: check, tools, run

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "healthcare")]
#[command(about = "Healthcare analytics over the Tuva Health BigQuery warehouse")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file (optional; environment variables override it)
    #[arg(
        short,
        long,
        env = "HEALTHCARE_MCP_CONFIG",
        default_value = "healthcare-mcp.toml"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    // ─── Serving ──────────────────────────────────────────────────
    /// Run the MCP server on stdio, querying BigQuery directly
    Mcp,

    /// Run the HTTP API server
    Serve {
        /// Address to bind (default from config, 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default from config or PORT, 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the MCP server on stdio, forwarding calls to a deployed HTTP server
    Bridge {
        /// Base URL of the HTTP server (default from config or CLOUD_RUN_URL)
        #[arg(short, long)]
        url: Option<String>,
    },

    // ─── Operations ───────────────────────────────────────────────
    /// Check BigQuery access and smoke-test the main tools
    Check,

    /// List the available tools
    Tools,

    /// Run a single tool and print its JSON result
    Run {
        /// Tool name, e.g. get_patient_demographics
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_args() {
        let cli = Cli::try_parse_from([
            "healthcare",
            "run",
            "get_hcc_risk_scores",
            "--args",
            r#"{"limit": 5}"#,
        ])
        .unwrap();
        match cli.command {
            Commands::Run { tool, args } => {
                assert_eq!(tool, "get_hcc_risk_scores");
                assert_eq!(args, r#"{"limit": 5}"#);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "healthcare",
            "--config",
            "/etc/hc.toml",
            "serve",
            "--port",
            "9090",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/hc.toml"));
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9090));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["healthcare"]).is_err());
    }
}
