//! Typed tool arguments.
//!
//! Every field has a default so a tool can be called with no arguments at
//! all. Unknown keys are ignored; an empty string in an optional filter
//! means "no filter".

use chrono::NaiveDate;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalyticsError, Result};
use crate::sql;

const DEFAULT_YEAR: i32 = 2018;

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(DEFAULT_YEAR, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(DEFAULT_YEAR, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Parse tool arguments, treating a missing/null argument object as `{}`.
pub fn from_args<T: DeserializeOwned>(args: &Value) -> Result<T> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(args).map_err(|e| AnalyticsError::InvalidParameter(e.to_string()))
}

/// The optional filter value, or `None` when absent or empty.
pub fn filter(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(AnalyticsError::InvalidParameter(format!(
            "start_date {} is after end_date {}",
            start, end
        )));
    }
    Ok(())
}

fn check_limit(limit: u32) -> Result<()> {
    if limit == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Four-digit calendar year. Accepts `"2018"` or `2018` on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Year(i32);

impl Year {
    pub fn new(year: i32) -> Result<Self> {
        if (1000..=9999).contains(&year) {
            Ok(Self(year))
        } else {
            Err(AnalyticsError::InvalidParameter(format!(
                "year must have four digits, got {}",
                year
            )))
        }
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl Default for Year {
    fn default() -> Self {
        Self(DEFAULT_YEAR)
    }
}

impl FromStr for Year {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "year must be YYYY, got '{}'",
                s
            )));
        }
        s.parse::<i32>()
            .map_err(|e| AnalyticsError::InvalidParameter(e.to_string()))
            .and_then(Self::new)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl Serialize for Year {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Year {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(D::Error::custom),
            Raw::Number(n) => i32::try_from(n)
                .map_err(D::Error::custom)
                .and_then(|n| Year::new(n).map_err(D::Error::custom)),
        }
    }
}

/// Arguments for `get_patient_demographics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicsParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Include the per-age-group breakdown.
    pub age_groups: bool,
}

impl Default for DemographicsParams {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            age_groups: true,
        }
    }
}

impl DemographicsParams {
    pub fn validate(&self) -> Result<()> {
        check_range(self.start_date, self.end_date)
    }
}

/// Arguments for `get_utilization_summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilizationParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub service_category: Option<String>,
}

impl Default for UtilizationParams {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            service_category: None,
        }
    }
}

impl UtilizationParams {
    pub fn validate(&self) -> Result<()> {
        check_range(self.start_date, self.end_date)
    }
}

/// Arguments for `get_pmpm_analysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PmpmParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payer: Option<String>,
}

impl Default for PmpmParams {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            payer: None,
        }
    }
}

impl PmpmParams {
    pub fn validate(&self) -> Result<()> {
        check_range(self.start_date, self.end_date)
    }
}

/// Arguments for `get_quality_measures_summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityMeasuresParams {
    /// A `summary_wide` column such as `adh_diabetes` or `cqm_130`.
    pub measure_name: Option<String>,
    /// Accepted for API compatibility; the wide summary has no period column.
    pub year: Year,
}

impl QualityMeasuresParams {
    pub fn validate(&self) -> Result<()> {
        if let Some(measure) = filter(&self.measure_name) {
            sql::identifier(measure)?;
        }
        Ok(())
    }
}

/// Arguments for `get_chronic_conditions_prevalence`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronicConditionsParams {
    pub condition_category: Option<String>,
    pub year: Year,
}

impl ChronicConditionsParams {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Arguments for `get_high_cost_patients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighCostParams {
    /// Minimum total paid for a patient to count as high-cost.
    pub cost_threshold: f64,
    pub year: Year,
    pub limit: u32,
}

impl Default for HighCostParams {
    fn default() -> Self {
        Self {
            cost_threshold: 10_000.0,
            year: Year::default(),
            limit: 100,
        }
    }
}

impl HighCostParams {
    pub fn validate(&self) -> Result<()> {
        if !self.cost_threshold.is_finite() || self.cost_threshold < 0.0 {
            return Err(AnalyticsError::InvalidParameter(format!(
                "cost_threshold must be a non-negative number, got {}",
                self.cost_threshold
            )));
        }
        check_limit(self.limit)
    }
}

/// Arguments for `get_readmissions_analysis`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadmissionsParams {
    pub year: Year,
    /// Substring matched against the primary diagnosis description.
    pub condition_category: Option<String>,
}

impl ReadmissionsParams {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Arguments for `get_hcc_risk_scores`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HccRiskParams {
    pub year: Year,
    pub limit: u32,
}

impl Default for HccRiskParams {
    fn default() -> Self {
        Self {
            year: Year::default(),
            limit: 1000,
        }
    }
}

impl HccRiskParams {
    pub fn validate(&self) -> Result<()> {
        check_limit(self.limit)
    }
}
