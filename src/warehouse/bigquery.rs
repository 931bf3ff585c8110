//! BigQuery REST client.
//!
//! Runs queries through `jobs.query`, then polls `jobs.getQueryResults`
//! until the job completes and every page has been read.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::auth::{Credentials, TokenSource};
use super::Warehouse;
use crate::config::{BigQueryConfig, Config};
use crate::error::{AnalyticsError, Result};
use crate::frame::{number, Frame};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    timeout_ms: u64,
    max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    request_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QueryResponse {
    job_complete: bool,
    job_reference: Option<JobReference>,
    schema: Option<TableSchema>,
    rows: Vec<TableRow>,
    page_token: Option<String>,
    errors: Vec<ErrorProto>,
    status: Option<JobStatus>,
}

impl QueryResponse {
    /// Turn a reply that reports a failed job into an error.
    ///
    /// `errors` may carry warnings next to a usable result, so it only fails
    /// the query when no schema came back.
    fn into_result(self) -> Result<Self> {
        let failure = self
            .status
            .as_ref()
            .and_then(|s| s.error_result.as_ref())
            .or_else(|| self.errors.first().filter(|_| self.schema.is_none()))
            .map(|e| e.message.clone());
        match failure {
            Some(message) => Err(query_failed(message)),
            None => Ok(self),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JobStatus {
    error_result: Option<ErrorProto>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
struct FieldSchema {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Executes SQL against BigQuery over its REST API.
pub struct BigQueryClient {
    http: reqwest::Client,
    tokens: TokenSource,
    project_id: String,
    settings: BigQueryConfig,
}

impl BigQueryClient {
    pub fn new(project_id: impl Into<String>, settings: BigQueryConfig, tokens: TokenSource) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens,
            project_id: project_id.into(),
            settings,
        }
    }

    /// Discover credentials and resolve the project from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = Credentials::discover(config)?;
        let project_id = config
            .project_id
            .clone()
            .or_else(|| credentials.project_id().map(String::from))
            .ok_or_else(|| {
                AnalyticsError::Config(
                    "GCP_PROJECT_ID is not set and the credentials name no project".to_string(),
                )
            })?;
        info!(project = %project_id, auth = credentials.kind(), "BigQuery client ready");
        let tokens = TokenSource::new(credentials, reqwest::Client::new());
        Ok(Self::new(project_id, config.bigquery.clone(), tokens))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn credentials(&self) -> &Credentials {
        self.tokens.credentials()
    }

    fn queries_url(&self) -> String {
        format!("{}/projects/{}/queries", self.settings.endpoint, self.project_id)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let token = self.tokens.token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));
            return Err(query_failed(message));
        }
        Ok(response.json().await?)
    }

    async fn poll(&self, job: &JobReference, page_token: Option<&str>) -> Result<QueryResponse> {
        let url = format!("{}/{}", self.queries_url(), job.job_id);
        let mut request = self.http.get(url).query(&[
            ("timeoutMs", self.settings.timeout_ms.to_string()),
            ("maxResults", self.settings.page_size.to_string()),
        ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        if let Some(location) = job.location.as_ref().or(self.settings.location.as_ref()) {
            request = request.query(&[("location", location)]);
        }
        self.send(request).await
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    async fn query(&self, sql: &str) -> Result<Frame> {
        let started = Instant::now();
        let deadline = started + Duration::from_secs(self.settings.max_wait_secs);

        let body = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            timeout_ms: self.settings.timeout_ms,
            max_results: self.settings.page_size,
            location: self.settings.location.as_deref(),
            request_id: uuid::Uuid::new_v4().to_string(),
        };
        debug!(sql = %sql, "submitting query");
        let first: QueryResponse = self
            .send::<QueryResponse>(self.http.post(self.queries_url()).json(&body))
            .await?
            .into_result()?;

        let job = first.job_reference;
        let mut schema = first.schema;
        let mut rows = first.rows;
        let mut complete = first.job_complete;
        let mut page_token = first.page_token;

        while !complete || page_token.is_some() {
            if Instant::now() >= deadline {
                return Err(query_failed(format!(
                    "timed out after {}s waiting for results",
                    self.settings.max_wait_secs
                )));
            }
            let job = job
                .as_ref()
                .ok_or_else(|| query_failed("response carried no job reference".to_string()))?;
            let page = self.poll(job, page_token.as_deref()).await?.into_result()?;
            complete = page.job_complete;
            if schema.is_none() {
                schema = page.schema;
            }
            if complete {
                rows.extend(page.rows);
                page_token = page.page_token;
            }
        }

        let fields = schema.map(|s| s.fields).unwrap_or_default();
        let frame = Frame::new(
            fields.iter().map(|f| f.name.clone()).collect(),
            rows.into_iter()
                .map(|row| decode_row(&fields, row.f))
                .collect(),
        );
        debug!(
            rows = frame.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query finished"
        );
        Ok(frame)
    }
}

fn query_failed(message: String) -> AnalyticsError {
    AnalyticsError::Query(format!("Query execution failed: {}", message))
}

fn decode_row(fields: &[FieldSchema], cells: Vec<TableCell>) -> Vec<Value> {
    fields
        .iter()
        .zip(cells)
        .map(|(field, cell)| decode_cell(field, &cell.v))
        .collect()
}

fn decode_cell(field: &FieldSchema, raw: &Value) -> Value {
    if raw.is_null() {
        return Value::Null;
    }
    if field.mode.as_deref() == Some("REPEATED") {
        return match raw {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| decode_scalar(field, item.get("v").unwrap_or(&Value::Null)))
                    .collect(),
            ),
            other => other.clone(),
        };
    }
    decode_scalar(field, raw)
}

fn decode_scalar(field: &FieldSchema, raw: &Value) -> Value {
    if raw.is_null() {
        return Value::Null;
    }
    let kind = field.field_type.to_ascii_uppercase();
    if kind == "RECORD" || kind == "STRUCT" {
        let cells = raw.get("f").and_then(Value::as_array);
        let Some(cells) = cells else {
            return raw.clone();
        };
        let record: Map<String, Value> = field
            .fields
            .iter()
            .zip(cells)
            .map(|(sub, cell)| {
                let v = cell.get("v").unwrap_or(&Value::Null);
                (sub.name.clone(), decode_cell(sub, v))
            })
            .collect();
        return Value::Object(record);
    }

    let Some(text) = raw.as_str() else {
        return raw.clone();
    };
    match kind.as_str() {
        "INTEGER" | "INT64" => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| raw.clone()),
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" | "DECIMAL" | "BIGDECIMAL" => text
            .parse::<f64>()
            .map(number)
            .unwrap_or_else(|_| raw.clone()),
        "BOOLEAN" | "BOOL" => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => raw.clone(),
        },
        "TIMESTAMP" => text
            .parse::<f64>()
            .ok()
            .and_then(|secs| {
                let micros = (secs * 1_000_000.0).round() as i64;
                DateTime::from_timestamp(
                    micros.div_euclid(1_000_000),
                    (micros.rem_euclid(1_000_000) * 1_000) as u32,
                )
            })
            .map(|ts| Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            .unwrap_or_else(|| raw.clone()),
        _ => raw.clone(),
    }
}
