//! # Healthcare MCP
//!
//! Healthcare analytics over a Tuva Health BigQuery warehouse, exposed as
//! Model Context Protocol tools.
//!
//! Each tool turns a handful of parameters (date ranges, filters,
//! thresholds) into a SQL query, runs it, and reshapes the result table into
//! a JSON dictionary.
//!
//! ## Surfaces
//!
//! - **MCP over stdio** backed by BigQuery (`healthcare mcp`, `healthcare-mcp`)
//! - **HTTP API** for Cloud Run style deployments (`healthcare serve`)
//! - **MCP bridge** forwarding tool calls to that HTTP API (`healthcare bridge`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use healthcare_mcp::{Analytics, AnalyticsRequest, Config, ToolKind};
//! use serde_json::json;
//!
//! # async fn demo() -> healthcare_mcp::Result<()> {
//! let config = Config::load("healthcare-mcp.toml".as_ref());
//! let analytics = Analytics::from_config(&config)?;
//!
//! let request = AnalyticsRequest::from_tool(ToolKind::HccRiskScores, &json!({"year": "2018"}))?;
//! let result = analytics.run(&request).await?;
//! println!("{}", serde_json::Value::Object(result));
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod backend;
pub mod bridge;
pub mod check;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod frame;
pub mod http;
pub mod mcp;
pub mod sql;
pub mod warehouse;

pub use analytics::{Analytics, AnalyticsRequest, ToolKind};
pub use backend::AnalyticsBackend;
pub use bridge::BridgeClient;
pub use config::Config;
pub use error::{AnalyticsError, Result};
pub use frame::Frame;
pub use warehouse::{BigQueryClient, Warehouse};
