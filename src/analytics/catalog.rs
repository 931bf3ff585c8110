//! The fixed tool catalog.
//!
//! One [`ToolKind`] per exposed tool. The catalog is the single source of
//! tool names, descriptions, JSON schemas and HTTP endpoints, shared by the
//! MCP server, the HTTP API and the bridge.

use serde_json::{json, Map, Value};
use std::fmt;

use super::params::{
    from_args, ChronicConditionsParams, DemographicsParams, HccRiskParams, HighCostParams,
    PmpmParams, QualityMeasuresParams, ReadmissionsParams, UtilizationParams,
};
use crate::error::{AnalyticsError, Result};

pub const SERVICE_NAME: &str = "Healthcare Analytics MCP Server";
pub const DATA_SOURCE: &str = "Tuva Health BigQuery dataset";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    PatientDemographics,
    UtilizationSummary,
    PmpmAnalysis,
    QualityMeasuresSummary,
    ChronicConditionsPrevalence,
    HighCostPatients,
    ReadmissionsAnalysis,
    HccRiskScores,
    ServiceInfo,
    HealthCheck,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::PatientDemographics,
        ToolKind::UtilizationSummary,
        ToolKind::PmpmAnalysis,
        ToolKind::QualityMeasuresSummary,
        ToolKind::ChronicConditionsPrevalence,
        ToolKind::HighCostPatients,
        ToolKind::ReadmissionsAnalysis,
        ToolKind::HccRiskScores,
        ToolKind::ServiceInfo,
        ToolKind::HealthCheck,
    ];

    /// The MCP tool name.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::PatientDemographics => "get_patient_demographics",
            ToolKind::UtilizationSummary => "get_utilization_summary",
            ToolKind::PmpmAnalysis => "get_pmpm_analysis",
            ToolKind::QualityMeasuresSummary => "get_quality_measures_summary",
            ToolKind::ChronicConditionsPrevalence => "get_chronic_conditions_prevalence",
            ToolKind::HighCostPatients => "get_high_cost_patients",
            ToolKind::ReadmissionsAnalysis => "get_readmissions_analysis",
            ToolKind::HccRiskScores => "get_hcc_risk_scores",
            ToolKind::ServiceInfo => "get_service_info",
            ToolKind::HealthCheck => "health_check",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// HTTP path relative to the API root.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ToolKind::PatientDemographics => "analytics/demographics",
            ToolKind::UtilizationSummary => "analytics/utilization",
            ToolKind::PmpmAnalysis => "analytics/pmpm",
            ToolKind::QualityMeasuresSummary => "analytics/quality-measures",
            ToolKind::ChronicConditionsPrevalence => "analytics/chronic-conditions",
            ToolKind::HighCostPatients => "analytics/high-cost-patients",
            ToolKind::ReadmissionsAnalysis => "analytics/readmissions",
            ToolKind::HccRiskScores => "analytics/hcc-risk-scores",
            ToolKind::ServiceInfo => "api/info",
            ToolKind::HealthCheck => "health",
        }
    }

    pub fn from_endpoint(endpoint: &str) -> Option<Self> {
        let endpoint = endpoint.trim_matches('/');
        Self::ALL.into_iter().find(|t| t.endpoint() == endpoint)
    }

    /// True for the eight warehouse-backed tools.
    pub fn is_analytics(&self) -> bool {
        !matches!(self, ToolKind::ServiceInfo | ToolKind::HealthCheck)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::PatientDemographics => {
                "Get patient demographic summary for the specified period: total patients, \
                average age, sex split, and optionally an age group breakdown."
            }
            ToolKind::UtilizationSummary => {
                "Get healthcare utilization summary for the specified period: claim and patient \
                counts, paid and allowed totals, and the top service categories."
            }
            ToolKind::PmpmAnalysis => {
                "Get Per Member Per Month (PMPM) financial analysis with category breakdowns \
                and monthly trends."
            }
            ToolKind::QualityMeasuresSummary => {
                "Get quality measures summary: numerator, denominator and performance rate for \
                one measure (column names like 'adh_diabetes', 'cqm_130') or for all measures."
            }
            ToolKind::ChronicConditionsPrevalence => {
                "Get chronic conditions prevalence: patient counts and prevalence rate per \
                condition family for the given year."
            }
            ToolKind::HighCostPatients => {
                "Identify high-cost patients for case management: patients whose total paid \
                amount for the year meets the cost threshold."
            }
            ToolKind::ReadmissionsAnalysis => {
                "Analyze 30-day readmission rates and patterns: encounters, readmissions, \
                readmission rate, average length of stay and total cost."
            }
            ToolKind::HccRiskScores => {
                "Get HCC risk score analysis for the patient population: average, median, \
                high/low risk counts and the score distribution."
            }
            ToolKind::ServiceInfo => "Get API information and available endpoints.",
            ToolKind::HealthCheck => {
                "Check the health status of the healthcare analytics service."
            }
        }
    }

    /// Line used in the service info endpoint table.
    fn summary(&self) -> &'static str {
        match self {
            ToolKind::PatientDemographics => "Patient demographics analysis",
            ToolKind::UtilizationSummary => "Healthcare utilization summary",
            ToolKind::PmpmAnalysis => "PMPM financial analysis",
            ToolKind::QualityMeasuresSummary => "Quality measures summary",
            ToolKind::ChronicConditionsPrevalence => "Chronic conditions prevalence",
            ToolKind::HighCostPatients => "High-cost patient identification",
            ToolKind::ReadmissionsAnalysis => "Readmissions analysis",
            ToolKind::HccRiskScores => "HCC risk scores analysis",
            ToolKind::ServiceInfo => "API information",
            ToolKind::HealthCheck => "Service health check",
        }
    }

    /// JSON Schema for the tool's arguments.
    pub fn input_schema(&self) -> Value {
        let properties = match self {
            ToolKind::PatientDemographics => json!({
                "start_date": date_prop("Start date for analysis (YYYY-MM-DD format)", "2018-01-01"),
                "end_date": date_prop("End date for analysis (YYYY-MM-DD format)", "2018-12-31"),
                "age_groups": {
                    "type": "boolean",
                    "description": "Whether to include age group breakdown",
                    "default": true
                }
            }),
            ToolKind::UtilizationSummary => json!({
                "start_date": date_prop("Start date for analysis (YYYY-MM-DD format)", "2018-01-01"),
                "end_date": date_prop("End date for analysis (YYYY-MM-DD format)", "2018-12-31"),
                "service_category": optional_string("Optional filter for specific service category")
            }),
            ToolKind::PmpmAnalysis => json!({
                "start_date": date_prop("Start date for analysis (YYYY-MM-DD format)", "2018-01-01"),
                "end_date": date_prop("End date for analysis (YYYY-MM-DD format)", "2018-12-31"),
                "payer": optional_string("Optional filter for specific payer")
            }),
            ToolKind::QualityMeasuresSummary => json!({
                "measure_name": optional_string(
                    "Optional filter for specific measure (use column names like 'adh_diabetes', 'cqm_130', etc.)"
                ),
                "year": year_prop()
            }),
            ToolKind::ChronicConditionsPrevalence => json!({
                "condition_category": optional_string("Optional filter for specific condition category"),
                "year": year_prop()
            }),
            ToolKind::HighCostPatients => json!({
                "cost_threshold": {
                    "type": "number",
                    "description": "Minimum cost threshold to be considered high-cost",
                    "default": 10000.0
                },
                "year": year_prop(),
                "limit": limit_prop("Maximum number of patients to return", 100)
            }),
            ToolKind::ReadmissionsAnalysis => json!({
                "year": year_prop(),
                "condition_category": optional_string("Optional filter for specific condition category")
            }),
            ToolKind::HccRiskScores => json!({
                "year": year_prop(),
                "limit": limit_prop("Maximum number of patients to analyze", 1000)
            }),
            ToolKind::ServiceInfo | ToolKind::HealthCheck => json!({}),
        };
        json!({
            "type": "object",
            "properties": properties
        })
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn date_prop(description: &str, default: &str) -> Value {
    json!({
        "type": "string",
        "format": "date",
        "description": description,
        "default": default
    })
}

fn optional_string(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

fn year_prop() -> Value {
    json!({
        "type": "string",
        "description": "Year for analysis (YYYY format)",
        "default": "2018"
    })
}

fn limit_prop(description: &str, default: u32) -> Value {
    json!({
        "type": "integer",
        "description": description,
        "minimum": 1,
        "default": default
    })
}

/// A parsed, typed analytics tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsRequest {
    PatientDemographics(DemographicsParams),
    UtilizationSummary(UtilizationParams),
    PmpmAnalysis(PmpmParams),
    QualityMeasuresSummary(QualityMeasuresParams),
    ChronicConditionsPrevalence(ChronicConditionsParams),
    HighCostPatients(HighCostParams),
    ReadmissionsAnalysis(ReadmissionsParams),
    HccRiskScores(HccRiskParams),
}

impl AnalyticsRequest {
    /// Parse and validate raw JSON arguments for an analytics tool.
    pub fn from_tool(kind: ToolKind, args: &Value) -> Result<Self> {
        let request = match kind {
            ToolKind::PatientDemographics => Self::PatientDemographics(from_args(args)?),
            ToolKind::UtilizationSummary => Self::UtilizationSummary(from_args(args)?),
            ToolKind::PmpmAnalysis => Self::PmpmAnalysis(from_args(args)?),
            ToolKind::QualityMeasuresSummary => Self::QualityMeasuresSummary(from_args(args)?),
            ToolKind::ChronicConditionsPrevalence => {
                Self::ChronicConditionsPrevalence(from_args(args)?)
            }
            ToolKind::HighCostPatients => Self::HighCostPatients(from_args(args)?),
            ToolKind::ReadmissionsAnalysis => Self::ReadmissionsAnalysis(from_args(args)?),
            ToolKind::HccRiskScores => Self::HccRiskScores(from_args(args)?),
            ToolKind::ServiceInfo | ToolKind::HealthCheck => {
                return Err(AnalyticsError::InvalidParameter(format!(
                    "{} is not an analytics tool",
                    kind
                )))
            }
        };
        request.validate()?;
        Ok(request)
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::PatientDemographics(_) => ToolKind::PatientDemographics,
            Self::UtilizationSummary(_) => ToolKind::UtilizationSummary,
            Self::PmpmAnalysis(_) => ToolKind::PmpmAnalysis,
            Self::QualityMeasuresSummary(_) => ToolKind::QualityMeasuresSummary,
            Self::ChronicConditionsPrevalence(_) => ToolKind::ChronicConditionsPrevalence,
            Self::HighCostPatients(_) => ToolKind::HighCostPatients,
            Self::ReadmissionsAnalysis(_) => ToolKind::ReadmissionsAnalysis,
            Self::HccRiskScores(_) => ToolKind::HccRiskScores,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::PatientDemographics(p) => p.validate(),
            Self::UtilizationSummary(p) => p.validate(),
            Self::PmpmAnalysis(p) => p.validate(),
            Self::QualityMeasuresSummary(p) => p.validate(),
            Self::ChronicConditionsPrevalence(p) => p.validate(),
            Self::HighCostPatients(p) => p.validate(),
            Self::ReadmissionsAnalysis(p) => p.validate(),
            Self::HccRiskScores(p) => p.validate(),
        }
    }

    /// Every parameter, defaults included, as a JSON object.
    pub fn to_json(&self) -> Result<Value> {
        let value = match self {
            Self::PatientDemographics(p) => serde_json::to_value(p)?,
            Self::UtilizationSummary(p) => serde_json::to_value(p)?,
            Self::PmpmAnalysis(p) => serde_json::to_value(p)?,
            Self::QualityMeasuresSummary(p) => serde_json::to_value(p)?,
            Self::ChronicConditionsPrevalence(p) => serde_json::to_value(p)?,
            Self::HighCostPatients(p) => serde_json::to_value(p)?,
            Self::ReadmissionsAnalysis(p) => serde_json::to_value(p)?,
            Self::HccRiskScores(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }
}

/// Static description of the service and its HTTP endpoints.
pub fn service_info() -> Value {
    let mut endpoints = Map::new();
    for tool in ToolKind::ALL {
        if tool == ToolKind::ServiceInfo {
            continue;
        }
        let key = match tool {
            ToolKind::HealthCheck => "health".to_string(),
            other => other.endpoint().trim_start_matches("analytics/").replace('-', "_"),
        };
        let method = if tool.is_analytics() { "POST" } else { "GET" };
        endpoints.insert(
            key,
            Value::String(format!("{} /{} - {}", method, tool.endpoint(), tool.summary())),
        );
    }
    json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
        "data_source": DATA_SOURCE,
        "authentication": "Google Cloud ADC"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for tool in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(tool.name()), Some(tool));
            assert_eq!(ToolKind::from_endpoint(tool.endpoint()), Some(tool));
        }
        assert_eq!(ToolKind::from_name("drop_tables"), None);
        assert_eq!(
            ToolKind::from_endpoint("/analytics/pmpm"),
            Some(ToolKind::PmpmAnalysis)
        );
    }

    #[test]
    fn test_schemas_are_objects() {
        for tool in ToolKind::ALL {
            let schema = tool.input_schema();
            assert_eq!(schema["type"], "object", "{}", tool);
            assert!(schema["properties"].is_object(), "{}", tool);
        }
        let schema = ToolKind::HighCostPatients.input_schema();
        assert_eq!(schema["properties"]["limit"]["default"], 100);
    }

    #[test]
    fn test_from_tool_applies_defaults_and_validates() {
        let req = AnalyticsRequest::from_tool(ToolKind::HccRiskScores, &json!({"year": "2019"}))
            .unwrap();
        assert_eq!(req.kind(), ToolKind::HccRiskScores);
        assert_eq!(req.to_json().unwrap(), json!({"year": "2019", "limit": 1000}));

        let err = AnalyticsRequest::from_tool(
            ToolKind::PatientDemographics,
            &json!({"start_date": "2018-12-31", "end_date": "2018-01-01"}),
        )
        .unwrap_err();
        assert!(err.is_client_error());

        assert!(AnalyticsRequest::from_tool(ToolKind::HealthCheck, &json!({})).is_err());
    }

    #[test]
    fn test_request_json_is_explicit() {
        let req =
            AnalyticsRequest::from_tool(ToolKind::UtilizationSummary, &json!({})).unwrap();
        assert_eq!(
            req.to_json().unwrap(),
            json!({
                "start_date": "2018-01-01",
                "end_date": "2018-12-31",
                "service_category": null
            })
        );
    }

    #[test]
    fn test_service_info_endpoints() {
        let info = service_info();
        assert_eq!(info["service"], SERVICE_NAME);
        let endpoints = info["endpoints"].as_object().unwrap();
        assert_eq!(endpoints.len(), 9);
        assert_eq!(endpoints["health"], "GET /health - Service health check");
        assert_eq!(
            endpoints["quality_measures"],
            "POST /analytics/quality-measures - Quality measures summary"
        );
        assert_eq!(
            endpoints["hcc_risk_scores"],
            "POST /analytics/hcc-risk-scores - HCC risk scores analysis"
        );
    }
}
