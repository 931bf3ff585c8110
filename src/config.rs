//! Service configuration.
//!
//! Settings come from an optional TOML file, then environment variables
//! override individual keys. The environment names match the ones used by
//! the deployment (`GCP_PROJECT_ID`, `GOOGLE_APPLICATION_CREDENTIALS`,
//! `BIGQUERY_DATASET_PREFIX`, `PORT`, `CLOUD_RUN_URL`, ...). A `.env` file in
//! the working directory supplies any of those the process environment lacks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{AnalyticsError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GCP project that runs the BigQuery jobs.
    pub project_id: Option<String>,
    /// Path to a service account or authorized-user JSON key.
    pub credentials_path: Option<PathBuf>,
    /// Prefix prepended to every `dataset.table` reference, e.g. `my-project.`.
    pub dataset_prefix: String,
    /// Pre-minted OAuth access token. Skips credential discovery when set.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub bigquery: BigQueryConfig,
    pub http: HttpConfig,
    pub bridge: BridgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BigQueryConfig {
    /// REST root, without a trailing slash.
    pub endpoint: String,
    /// Job location (e.g. `US`). Left to BigQuery when unset.
    pub location: Option<String>,
    /// How long a single `queries` call may block server-side.
    pub timeout_ms: u64,
    /// Rows fetched per page.
    pub page_size: u32,
    /// Upper bound on the total time spent waiting for one query.
    pub max_wait_secs: u64,
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://bigquery.googleapis.com/bigquery/v2".to_string(),
            location: None,
            timeout_ms: 10_000,
            page_size: 10_000,
            max_wait_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the deployed HTTP analytics API.
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load from `path` and apply environment overrides.
    ///
    /// A missing file yields the defaults. A file that fails to parse is
    /// logged and also yields the defaults.
    pub fn load(path: &Path) -> Self {
        Self::load_with_dotenv(path, Path::new(".env"))
    }

    /// Like [`Config::load`], with `KEY=value` pairs from `dotenv` as a
    /// fallback. Variables set in the process environment take precedence.
    pub fn load_with_dotenv(path: &Path, dotenv: &Path) -> Self {
        let mut config = Self::from_file(path);
        let file_vars = read_dotenv(dotenv);
        config.apply_env(|key| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .or_else(|| file_vars.get(key).cloned())
        });
        config
    }

    fn from_file(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable config file, using defaults");
                Self::default()
            }
        }
    }

    /// Override fields from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("GCP_PROJECT_ID") {
            self.project_id = Some(v);
        }
        if let Some(v) = get("GOOGLE_APPLICATION_CREDENTIALS") {
            self.credentials_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("BIGQUERY_DATASET_PREFIX") {
            self.dataset_prefix = v;
        }
        if let Some(v) = get("BIGQUERY_ACCESS_TOKEN") {
            self.access_token = Some(v);
        }
        if let Some(v) = get("BIGQUERY_LOCATION") {
            self.bigquery.location = Some(v);
        }
        if let Some(v) = get("BIGQUERY_ENDPOINT") {
            self.bigquery.endpoint = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("PORT") {
            match v.parse() {
                Ok(port) => self.http.port = port,
                Err(_) => warn!(value = %v, "ignoring non-numeric PORT"),
            }
        }
        if let Some(v) = get("CLOUD_RUN_URL") {
            self.bridge.url = v;
        }
    }

    /// Reject settings that would produce broken SQL or requests.
    pub fn validate(&self) -> Result<()> {
        if self.dataset_prefix.contains('`') {
            return Err(AnalyticsError::Config(
                "dataset prefix must not contain backticks".to_string(),
            ));
        }
        if self.bigquery.page_size == 0 {
            return Err(AnalyticsError::Config(
                "bigquery.page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_dotenv(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return HashMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable .env file, ignoring");
            return HashMap::new();
        }
    };
    let mut vars = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping malformed .env line"),
        }
    }
    debug!(path = %path.display(), count = vars.len(), "loaded .env file");
    vars
}
