//! Tool execution against a [`Warehouse`].

use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error};

use super::catalog::{AnalyticsRequest, ToolKind};
use super::params::{
    filter, ChronicConditionsParams, DemographicsParams, HccRiskParams, HighCostParams,
    PmpmParams, QualityMeasuresParams, ReadmissionsParams, UtilizationParams,
};
use super::queries;
use crate::config::Config;
use crate::error::Result;
use crate::frame::{number, ColumnStats, Frame};
use crate::sql::QueryBuilder;
use crate::warehouse::{BigQueryClient, Warehouse};

const HIGH_RISK_SCORE: f64 = 2.0;
const LOW_RISK_SCORE: f64 = 1.0;

/// Runs analytics tools and reshapes their results into dictionaries.
#[derive(Clone)]
pub struct Analytics {
    warehouse: Arc<dyn Warehouse>,
    tables: QueryBuilder,
}

impl Analytics {
    pub fn new(warehouse: Arc<dyn Warehouse>, dataset_prefix: impl Into<String>) -> Self {
        Self {
            warehouse,
            tables: QueryBuilder::new(dataset_prefix),
        }
    }

    /// Connect to BigQuery using the configured credentials.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = BigQueryClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), config.dataset_prefix.clone()))
    }

    pub fn tables(&self) -> &QueryBuilder {
        &self.tables
    }

    /// Execute raw SQL through the underlying warehouse.
    pub async fn query(&self, sql: &str) -> Result<Frame> {
        self.warehouse.query(sql).await
    }

    /// Run one tool invocation.
    pub async fn run(&self, request: &AnalyticsRequest) -> Result<Map<String, Value>> {
        let tool = request.kind();
        debug!(tool = %tool, "running analytics tool");
        let result = match request {
            AnalyticsRequest::PatientDemographics(p) => self.patient_demographics(p).await,
            AnalyticsRequest::UtilizationSummary(p) => self.utilization_summary(p).await,
            AnalyticsRequest::PmpmAnalysis(p) => self.pmpm_analysis(p).await,
            AnalyticsRequest::QualityMeasuresSummary(p) => self.quality_measures(p).await,
            AnalyticsRequest::ChronicConditionsPrevalence(p) => self.chronic_conditions(p).await,
            AnalyticsRequest::HighCostPatients(p) => self.high_cost_patients(p).await,
            AnalyticsRequest::ReadmissionsAnalysis(p) => self.readmissions(p).await,
            AnalyticsRequest::HccRiskScores(p) => self.hcc_risk_scores(p).await,
        };
        if let Err(e) = &result {
            error!(tool = %tool, error = %e, "analytics tool failed");
        }
        result
    }

    /// Parse raw arguments for `tool` and run it.
    pub async fn run_tool(&self, tool: ToolKind, args: &Value) -> Result<Map<String, Value>> {
        let request = AnalyticsRequest::from_tool(tool, args)?;
        self.run(&request).await
    }

    pub async fn patient_demographics(&self, p: &DemographicsParams) -> Result<Map<String, Value>> {
        p.validate()?;
        let summary_sql = queries::demographics_summary(&self.tables, p);
        let result = if p.age_groups {
            let groups_sql = queries::demographics_age_groups(&self.tables, p);
            let (summary, groups) = tokio::try_join!(
                self.warehouse.query(&summary_sql),
                self.warehouse.query(&groups_sql)
            )?;
            let mut result = summary.first_record();
            result.insert("age_groups".to_string(), groups.records_value());
            result
        } else {
            self.warehouse.query(&summary_sql).await?.first_record()
        };
        Ok(result)
    }

    pub async fn utilization_summary(&self, p: &UtilizationParams) -> Result<Map<String, Value>> {
        p.validate()?;
        let summary_sql = queries::utilization_summary(&self.tables, p);
        let top_sql = queries::utilization_top_categories(&self.tables, p);
        let (summary, top) = tokio::try_join!(
            self.warehouse.query(&summary_sql),
            self.warehouse.query(&top_sql)
        )?;
        let mut result = summary.first_record();
        result.insert("top_service_categories".to_string(), top.records_value());
        Ok(result)
    }

    pub async fn pmpm_analysis(&self, p: &PmpmParams) -> Result<Map<String, Value>> {
        p.validate()?;
        let summary_sql = queries::pmpm_summary(&self.tables, p);
        let trends_sql = queries::pmpm_monthly_trends(&self.tables, p);
        let (summary, trends) = tokio::try_join!(
            self.warehouse.query(&summary_sql),
            self.warehouse.query(&trends_sql)
        )?;
        let mut result = summary.first_record();
        result.insert("monthly_trends".to_string(), trends.records_value());
        Ok(result)
    }

    pub async fn quality_measures(&self, p: &QualityMeasuresParams) -> Result<Map<String, Value>> {
        p.validate()?;
        if let Some(measure) = filter(&p.measure_name) {
            let frame = self
                .warehouse
                .query(&queries::quality_measure(&self.tables, measure))
                .await?;
            let mut result = frame.first_record();
            result.insert("measure_name".to_string(), Value::String(measure.to_string()));
            return Ok(result);
        }

        let frame = self
            .warehouse
            .query(&queries::quality_all_measures(&self.tables))
            .await?;
        let mut result = Map::new();
        result.insert("measures_count".to_string(), Value::from(frame.len()));
        if !frame.is_empty() {
            let rates = frame.column_f64("performance_rate_pct");
            let avg = ColumnStats::new(&rates).mean();
            result.insert(
                "avg_performance_rate".to_string(),
                avg.map(number).unwrap_or(Value::Null),
            );
        }
        result.insert("measures".to_string(), frame.records_value());
        Ok(result)
    }

    pub async fn chronic_conditions(
        &self,
        p: &ChronicConditionsParams,
    ) -> Result<Map<String, Value>> {
        p.validate()?;
        let frame = self
            .warehouse
            .query(&queries::chronic_conditions(&self.tables, p))
            .await?;
        let mut result = Map::new();
        result.insert("conditions_analyzed".to_string(), Value::from(frame.len()));
        result.insert("conditions".to_string(), frame.records_value());
        Ok(result)
    }

    pub async fn high_cost_patients(&self, p: &HighCostParams) -> Result<Map<String, Value>> {
        p.validate()?;
        let frame = self
            .warehouse
            .query(&queries::high_cost_patients(&self.tables, p))
            .await?;
        let paid = frame.column_f64("total_paid");
        let stats = ColumnStats::new(&paid);
        let mut result = Map::new();
        result.insert("high_cost_patient_count".to_string(), Value::from(frame.len()));
        result.insert("total_cost_all_patients".to_string(), number(stats.sum()));
        result.insert(
            "avg_cost_per_patient".to_string(),
            number(stats.mean().unwrap_or(0.0)),
        );
        result.insert("patients".to_string(), frame.records_value());
        Ok(result)
    }

    pub async fn readmissions(&self, p: &ReadmissionsParams) -> Result<Map<String, Value>> {
        p.validate()?;
        let frame = self
            .warehouse
            .query(&queries::readmissions(&self.tables, p))
            .await?;
        Ok(frame.first_record())
    }

    pub async fn hcc_risk_scores(&self, p: &HccRiskParams) -> Result<Map<String, Value>> {
        p.validate()?;
        let frame = self
            .warehouse
            .query(&queries::hcc_risk_scores(&self.tables, p))
            .await?;
        let scores = frame.column_f64("hcc_risk_score");
        let stats = ColumnStats::new(&scores);

        let mut result = Map::new();
        result.insert("patients_analyzed".to_string(), Value::from(frame.len()));
        if frame.is_empty() {
            result.insert("avg_risk_score".to_string(), Value::from(0));
            result.insert("median_risk_score".to_string(), Value::from(0));
            result.insert("high_risk_patients".to_string(), Value::from(0));
            result.insert("low_risk_patients".to_string(), Value::from(0));
            result.insert("risk_score_distribution".to_string(), json!({}));
        } else {
            result.insert(
                "avg_risk_score".to_string(),
                stats.mean().map(number).unwrap_or(Value::Null),
            );
            result.insert(
                "median_risk_score".to_string(),
                stats.median().map(number).unwrap_or(Value::Null),
            );
            result.insert(
                "high_risk_patients".to_string(),
                Value::from(stats.count_where(|s| s > HIGH_RISK_SCORE)),
            );
            result.insert(
                "low_risk_patients".to_string(),
                Value::from(stats.count_where(|s| s < LOW_RISK_SCORE)),
            );
            result.insert(
                "risk_score_distribution".to_string(),
                Value::Object(stats.describe()),
            );
        }
        Ok(result)
    }

    /// Cheap end-to-end probe: a one-day demographics query.
    pub async fn health(&self) -> Result<Value> {
        let probe = DemographicsParams {
            end_date: DemographicsParams::default().start_date,
            age_groups: false,
            ..DemographicsParams::default()
        };
        let summary = self.patient_demographics(&probe).await.map_err(|e| {
            error!(error = %e, "health check failed");
            e
        })?;
        Ok(json!({
            "status": "healthy",
            "service": "Healthcare MCP Server",
            "bigquery_connection": "ok",
            "total_patients": summary.get("total_patients").cloned().unwrap_or(Value::Null),
        }))
    }
}
