//! The analytics tools: catalog, arguments, SQL and execution.

pub mod catalog;
pub mod params;
pub mod queries;
pub mod service;

pub use catalog::{service_info, AnalyticsRequest, ToolKind, DATA_SOURCE, SERVICE_NAME};
pub use params::{
    ChronicConditionsParams, DemographicsParams, HccRiskParams, HighCostParams, PmpmParams,
    QualityMeasuresParams, ReadmissionsParams, UtilizationParams, Year,
};
pub use service::Analytics;
