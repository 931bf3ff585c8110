//! Error types shared across the crate.

use thiserror::Error;

/// Everything that can go wrong between a tool call and its response.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A caller-supplied argument failed validation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The warehouse rejected or failed a query.
    #[error("{0}")]
    Query(String),

    /// Credentials could not be loaded or exchanged for a token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Missing or inconsistent configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The remote analytics API (bridge mode) failed.
    #[error("{0}")]
    Remote(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalyticsError {
    /// True when the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalyticsError::InvalidParameter(_) | AnalyticsError::UnknownTool(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
