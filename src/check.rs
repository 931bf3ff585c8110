//! `healthcare check`: an end-to-end diagnostic of a deployment.
//!
//! Verifies BigQuery connectivity, access to the Tuva tables, and that the
//! main tools return data, then prints a pass/fail report.

use std::fmt;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::warn;

use crate::analytics::{
    queries, Analytics, DemographicsParams, PmpmParams, QualityMeasuresParams, UtilizationParams,
    Year,
};
use crate::config::Config;
use crate::error::{AnalyticsError, Result};
use crate::format;

/// Year of the Tuva demo claims, used for the date-range smoke tests.
const SMOKE_TEST_YEAR: i32 = 2018;
const QUALITY_SMOKE_TEST_YEAR: i32 = 2022;
const RULE: &str = "==================================================";

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    fn from_result(name: &str, result: Result<String>) -> Self {
        match result {
            Ok(detail) => Self {
                name: name.to_string(),
                passed: true,
                detail,
            },
            Err(e) => {
                warn!(check = %name, error = %e, "check failed");
                Self {
                    name: name.to_string(),
                    passed: false,
                    detail: e.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// `(label, value)` pairs describing the environment.
    pub environment: Vec<(String, String)>,
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == self.outcomes.len()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Healthcare Analytics MCP Server - Diagnostics")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Environment:")?;
        for (label, value) in &self.environment {
            writeln!(f, "  {}: {}", label, value)?;
        }
        writeln!(f)?;
        for outcome in &self.outcomes {
            let mark = if outcome.passed { "PASS" } else { "FAIL" };
            writeln!(f, "[{}] {}: {}", mark, outcome.name, outcome.detail)?;
        }
        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "Summary: {}/{} checks passed",
            self.passed(),
            self.outcomes.len()
        )?;
        if !self.all_passed() {
            writeln!(f)?;
            writeln!(f, "Common issues:")?;
            writeln!(f, "  1. GCP_PROJECT_ID or the config file points at the wrong project")?;
            writeln!(f, "  2. Google Cloud credentials are missing or expired")?;
            writeln!(f, "  3. Tuva Health data is not loaded under BIGQUERY_DATASET_PREFIX")?;
        }
        Ok(())
    }
}

/// Describe the environment as `check` sees it.
pub fn environment(config: &Config) -> Vec<(String, String)> {
    let or_unset = |v: Option<String>| v.unwrap_or_else(|| "Not set".to_string());
    let prefix = if config.dataset_prefix.is_empty() {
        None
    } else {
        Some(config.dataset_prefix.clone())
    };
    vec![
        ("Version".to_string(), env!("CARGO_PKG_VERSION").to_string()),
        ("GCP Project ID".to_string(), or_unset(config.project_id.clone())),
        ("Dataset Prefix".to_string(), or_unset(prefix)),
        (
            "Credentials Path".to_string(),
            or_unset(
                config
                    .credentials_path
                    .as_ref()
                    .map(|p| p.display().to_string()),
            ),
        ),
    ]
}

/// Run every check in order. Later checks still run when earlier ones fail.
pub async fn run(config: &Config, analytics: &Analytics, auth_mode: &str) -> CheckReport {
    let mut report = CheckReport {
        environment: environment(config),
        outcomes: Vec::new(),
    };
    report
        .environment
        .push(("Authentication".to_string(), auth_mode.to_string()));

    report.outcomes.push(CheckOutcome::from_result(
        "BigQuery connection",
        connectivity(analytics).await,
    ));
    report.outcomes.push(CheckOutcome::from_result(
        "Tuva data access",
        data_access(analytics).await,
    ));
    for outcome in smoke_tests(analytics).await {
        report.outcomes.push(outcome);
    }
    report
}

async fn connectivity(analytics: &Analytics) -> Result<String> {
    let frame = analytics.query(queries::connectivity_probe()).await?;
    let value = frame.first_record().get("test_value").and_then(as_i64);
    if value == Some(1) {
        Ok("SELECT 1 returned 1".to_string())
    } else {
        Err(AnalyticsError::Query(format!(
            "unexpected probe result: {:?}",
            value
        )))
    }
}

async fn data_access(analytics: &Analytics) -> Result<String> {
    let frame = analytics
        .query(&queries::patient_count(analytics.tables()))
        .await?;
    let count = frame
        .first_record()
        .get("patient_count")
        .and_then(as_i64)
        .unwrap_or(0);
    Ok(format!(
        "Found {} patients in core.patient table",
        format::thousands(count)
    ))
}

async fn smoke_tests(analytics: &Analytics) -> Vec<CheckOutcome> {
    let start = NaiveDate::from_ymd_opt(SMOKE_TEST_YEAR, 1, 1).unwrap_or(NaiveDate::MIN);
    let end = NaiveDate::from_ymd_opt(SMOKE_TEST_YEAR, 12, 31).unwrap_or(NaiveDate::MAX);
    let mut outcomes = Vec::new();

    let demographics = DemographicsParams {
        start_date: start,
        end_date: end,
        age_groups: true,
    };
    outcomes.push(CheckOutcome::from_result(
        "get_patient_demographics",
        analytics.patient_demographics(&demographics).await.map(|r| {
            format!("Found {} patients", format::thousands(int(&r, "total_patients")))
        }),
    ));

    let utilization = UtilizationParams {
        start_date: start,
        end_date: end,
        service_category: None,
    };
    outcomes.push(CheckOutcome::from_result(
        "get_utilization_summary",
        analytics.utilization_summary(&utilization).await.map(|r| {
            format!(
                "Found {} claims, {} paid",
                format::thousands(int(&r, "total_claims")),
                format::currency(float(&r, "total_paid"))
            )
        }),
    ));

    let pmpm = PmpmParams {
        start_date: start,
        end_date: end,
        payer: None,
    };
    outcomes.push(CheckOutcome::from_result(
        "get_pmpm_analysis",
        analytics
            .pmpm_analysis(&pmpm)
            .await
            .map(|r| format!("Analyzed {} months of data", int(&r, "months_analyzed"))),
    ));

    let quality = QualityMeasuresParams {
        measure_name: None,
        year: Year::new(QUALITY_SMOKE_TEST_YEAR).unwrap_or_default(),
    };
    outcomes.push(CheckOutcome::from_result(
        "get_quality_measures_summary",
        analytics.quality_measures(&quality).await.map(|r| {
            let mut detail = format!("Found {} quality measures", int(&r, "measures_count"));
            if r.contains_key("avg_performance_rate") {
                detail.push_str(&format!(
                    ", average performance {}",
                    format::percentage(float(&r, "avg_performance_rate"))
                ));
            }
            detail
        }),
    ));

    outcomes
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn int(record: &Map<String, Value>, key: &str) -> i64 {
    record.get(key).and_then(as_i64).unwrap_or(0)
}

fn float(record: &Map<String, Value>, key: &str) -> f64 {
    record
        .get(key)
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .unwrap_or(0.0)
}
