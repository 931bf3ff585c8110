//! MCP-to-HTTP bridge backend.
//!
//! Forwards each tool call to a running `healthcare serve` instance (for
//! example on Cloud Run) and relays its JSON answer.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use crate::analytics::{AnalyticsRequest, ToolKind};
use crate::backend::AnalyticsBackend;
use crate::config::BridgeConfig;
use crate::error::{AnalyticsError, Result};

#[derive(Debug, Clone)]
pub struct BridgeClient {
    base_url: String,
    client: Client,
}

impl BridgeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Self::new(&config.url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `data` to `endpoint`, or GET it when there is no body.
    pub async fn call_api(&self, endpoint: &str, data: Option<&Value>) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let request = match data {
            Some(body) => {
                debug!(url = %url, "POST request");
                self.client.post(&url).json(body)
            }
            None => {
                debug!(url = %url, "GET request");
                self.client.get(&url)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| AnalyticsError::Remote(format!("API request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyticsError::Remote(format!(
                "API returned error {}: {}",
                status.as_u16(),
                body
            )));
        }
        response
            .json()
            .await
            .map_err(|e| AnalyticsError::Remote(format!("API request failed: {}", e)))
    }
}

#[async_trait]
impl AnalyticsBackend for BridgeClient {
    async fn run(&self, request: &AnalyticsRequest) -> Result<Map<String, Value>> {
        let body = request.to_json()?;
        match self.call_api(request.kind().endpoint(), Some(&body)).await? {
            Value::Object(map) => Ok(map),
            other => Err(AnalyticsError::Remote(format!(
                "expected a JSON object from {}, got {}",
                request.kind().endpoint(),
                other
            ))),
        }
    }

    async fn health(&self) -> Result<Value> {
        self.call_api(ToolKind::HealthCheck.endpoint(), None).await
    }

    async fn service_info(&self) -> Result<Value> {
        self.call_api(ToolKind::ServiceInfo.endpoint(), None).await
    }
}
