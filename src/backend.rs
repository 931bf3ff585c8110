//! The execution backend behind the MCP server.
//!
//! Tools either run in-process against BigQuery ([`Analytics`]) or are
//! forwarded to a deployed HTTP server ([`BridgeClient`](crate::bridge::BridgeClient)).

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::analytics::{self, Analytics, AnalyticsRequest, ToolKind};
use crate::error::{AnalyticsError, Result};

#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    async fn run(&self, request: &AnalyticsRequest) -> Result<Map<String, Value>>;

    async fn health(&self) -> Result<Value>;

    async fn service_info(&self) -> Result<Value>;

    /// Invoke a tool by name with raw JSON arguments.
    async fn call(&self, tool: &str, args: &Value) -> Result<Value> {
        let kind = ToolKind::from_name(tool)
            .ok_or_else(|| AnalyticsError::UnknownTool(tool.to_string()))?;
        match kind {
            ToolKind::ServiceInfo => self.service_info().await,
            ToolKind::HealthCheck => self.health().await,
            _ => {
                let request = AnalyticsRequest::from_tool(kind, args)?;
                self.run(&request).await.map(Value::Object)
            }
        }
    }
}

#[async_trait]
impl AnalyticsBackend for Analytics {
    async fn run(&self, request: &AnalyticsRequest) -> Result<Map<String, Value>> {
        Analytics::run(self, request).await
    }

    async fn health(&self) -> Result<Value> {
        Analytics::health(self).await
    }

    async fn service_info(&self) -> Result<Value> {
        Ok(analytics::service_info())
    }
}
