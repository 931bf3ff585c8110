//! SQL text for each analytics tool.
//!
//! Pure functions: parameters in, Standard SQL out. Tables are resolved
//! through [`QueryBuilder`] so the dataset prefix is applied uniformly.

use super::params::{
    filter, ChronicConditionsParams, DemographicsParams, HccRiskParams, HighCostParams,
    PmpmParams, ReadmissionsParams, UtilizationParams, Year,
};
use crate::sql::{like_contains, quote, QueryBuilder};

/// Measures summarised when no specific measure is requested.
pub const QUALITY_MEASURES: [&str; 5] = [
    "adh_diabetes",
    "adh_ras",
    "adh_statins",
    "cqm_130",
    "cqm_438",
];

/// Enrollment-overlap filter shared by the demographics queries.
fn enrollment_overlap(p: &DemographicsParams) -> String {
    format!(
        "e.enrollment_start_date <= {}\n      AND e.enrollment_end_date >= {}",
        quote(&p.end_date.to_string()),
        quote(&p.start_date.to_string())
    )
}

fn year_prefix(column: &str, year: Year) -> String {
    format!("CAST({} AS STRING) LIKE {}", column, quote(&format!("{}%", year)))
}

pub fn demographics_summary(q: &QueryBuilder, p: &DemographicsParams) -> String {
    format!(
        "SELECT
    COUNT(DISTINCT p.person_id) AS total_patients,
    AVG(p.age) AS avg_age,
    SAFE_DIVIDE(COUNTIF(p.sex = 'female'), COUNT(*)) * 100 AS female_pct,
    SAFE_DIVIDE(COUNTIF(p.sex = 'male'), COUNT(*)) * 100 AS male_pct
FROM {patient} p
INNER JOIN {eligibility} e ON p.person_id = e.person_id
WHERE {overlap}",
        patient = q.table("core.patient"),
        eligibility = q.table("core.eligibility"),
        overlap = enrollment_overlap(p),
    )
}

pub fn demographics_age_groups(q: &QueryBuilder, p: &DemographicsParams) -> String {
    format!(
        "SELECT
    p.age_group,
    COUNT(*) AS count,
    SAFE_DIVIDE(COUNT(*), SUM(COUNT(*)) OVER()) * 100 AS percentage
FROM {patient} p
INNER JOIN {eligibility} e ON p.person_id = e.person_id
WHERE {overlap}
  AND p.age_group IS NOT NULL
GROUP BY p.age_group
ORDER BY p.age_group",
        patient = q.table("core.patient"),
        eligibility = q.table("core.eligibility"),
        overlap = enrollment_overlap(p),
    )
}

fn utilization_where(p: &UtilizationParams) -> String {
    let mut clause = format!(
        "WHERE claim_start_date BETWEEN {} AND {}",
        quote(&p.start_date.to_string()),
        quote(&p.end_date.to_string())
    );
    if let Some(category) = filter(&p.service_category) {
        clause.push_str(&format!(" AND service_category_1 = {}", quote(category)));
    }
    clause
}

pub fn utilization_summary(q: &QueryBuilder, p: &UtilizationParams) -> String {
    format!(
        "SELECT
    COUNT(DISTINCT claim_id) AS total_claims,
    COUNT(DISTINCT person_id) AS unique_patients,
    SUM(paid_amount) AS total_paid,
    SUM(allowed_amount) AS total_allowed,
    AVG(paid_amount) AS avg_paid_per_claim,
    AVG(allowed_amount) AS avg_allowed_per_claim
FROM {claims}
{filter}",
        claims = q.table("core.medical_claim"),
        filter = utilization_where(p),
    )
}

pub fn utilization_top_categories(q: &QueryBuilder, p: &UtilizationParams) -> String {
    format!(
        "SELECT
    service_category_1,
    COUNT(*) AS claim_count,
    SUM(paid_amount) AS total_paid,
    SAFE_DIVIDE(COUNT(*), SUM(COUNT(*)) OVER()) * 100 AS percentage_of_claims
FROM {claims}
{filter}
GROUP BY service_category_1
ORDER BY claim_count DESC
LIMIT 10",
        claims = q.table("core.medical_claim"),
        filter = utilization_where(p),
    )
}

fn pmpm_where(p: &PmpmParams) -> String {
    let mut clause = format!(
        "WHERE year_month BETWEEN {} AND {}",
        quote(&p.start_date.format("%Y-%m").to_string()),
        quote(&p.end_date.format("%Y-%m").to_string())
    );
    if let Some(payer) = filter(&p.payer) {
        clause.push_str(&format!(" AND payer = {}", quote(payer)));
    }
    clause
}

pub fn pmpm_summary(q: &QueryBuilder, p: &PmpmParams) -> String {
    format!(
        "SELECT
    AVG(SAFE_DIVIDE(total_allowed, member_months)) AS avg_total_allowed_pmpm,
    AVG(SAFE_DIVIDE(total_paid, member_months)) AS avg_total_paid_pmpm,
    AVG(SAFE_DIVIDE(inpatient_allowed, member_months)) AS avg_inpatient_allowed_pmpm,
    AVG(SAFE_DIVIDE(outpatient_allowed, member_months)) AS avg_outpatient_allowed_pmpm,
    AVG(SAFE_DIVIDE(office_based_allowed, member_months)) AS avg_office_visit_allowed_pmpm,
    AVG(SAFE_DIVIDE(ancillary_allowed, member_months)) AS avg_ancillary_allowed_pmpm,
    COUNT(DISTINCT year_month) AS months_analyzed,
    SUM(member_months) AS total_member_months
FROM {pmpm}
{filter}",
        pmpm = q.table("financial_pmpm.pmpm_payer"),
        filter = pmpm_where(p),
    )
}

pub fn pmpm_monthly_trends(q: &QueryBuilder, p: &PmpmParams) -> String {
    format!(
        "SELECT
    year_month,
    AVG(SAFE_DIVIDE(total_allowed, member_months)) AS monthly_allowed_pmpm,
    AVG(SAFE_DIVIDE(total_paid, member_months)) AS monthly_paid_pmpm,
    SUM(member_months) AS member_months
FROM {pmpm}
{filter}
GROUP BY year_month
ORDER BY year_month",
        pmpm = q.table("financial_pmpm.pmpm_payer"),
        filter = pmpm_where(p),
    )
}

/// Numerator/denominator/rate for one measure column. `measure` must
/// already be a validated identifier.
fn measure_select(q: &QueryBuilder, measure: &str, label: bool) -> String {
    let head = if label {
        format!("{} AS measure_name", quote(measure))
    } else {
        "COUNT(DISTINCT person_id) AS total_patients".to_string()
    };
    format!(
        "SELECT
    {head},
    SUM(CASE WHEN {m} = 1 THEN 1 ELSE 0 END) AS numerator,
    COUNT(CASE WHEN {m} IS NOT NULL THEN person_id END) AS denominator,
    ROUND(SAFE_DIVIDE(SUM(CASE WHEN {m} = 1 THEN 1 ELSE 0 END), COUNT(CASE WHEN {m} IS NOT NULL THEN person_id END)) * 100, 2) AS performance_rate_pct
FROM {table}",
        head = head,
        m = measure,
        table = q.table("quality_measures.summary_wide"),
    )
}

pub fn quality_measure(q: &QueryBuilder, measure: &str) -> String {
    measure_select(q, measure, false)
}

pub fn quality_all_measures(q: &QueryBuilder) -> String {
    let selects: Vec<String> = QUALITY_MEASURES
        .iter()
        .map(|m| measure_select(q, m, true))
        .collect();
    format!("{}\nORDER BY measure_name", selects.join("\nUNION ALL\n"))
}

pub fn chronic_conditions(q: &QueryBuilder, p: &ChronicConditionsParams) -> String {
    let mut filter_clause = format!("WHERE {}", year_prefix("condition_date", p.year));
    if let Some(category) = filter(&p.condition_category) {
        filter_clause.push_str(&format!(" AND condition_family = {}", quote(category)));
    }
    format!(
        "SELECT
    condition_family,
    COUNT(DISTINCT person_id) AS patient_count,
    SAFE_DIVIDE(COUNT(DISTINCT person_id), (
        SELECT COUNT(DISTINCT person_id)
        FROM {conditions}
        WHERE {year_filter}
    )) * 100 AS prevalence_rate
FROM {chronic}
{filter}
GROUP BY condition_family
ORDER BY patient_count DESC
LIMIT 20",
        conditions = q.table("core.condition"),
        year_filter = year_prefix("condition_date", p.year),
        chronic = q.table("chronic_conditions.tuva_chronic_conditions_long"),
        filter = filter_clause,
    )
}

pub fn high_cost_patients(q: &QueryBuilder, p: &HighCostParams) -> String {
    format!(
        "WITH patient_costs AS (
    SELECT
        person_id,
        SUM(paid_amount) AS total_paid,
        SUM(allowed_amount) AS total_allowed,
        COUNT(DISTINCT claim_id) AS total_claims,
        COUNT(DISTINCT CASE WHEN claim_type = 'institutional' THEN claim_id END) AS inpatient_claims,
        COUNT(DISTINCT CASE WHEN claim_type = 'professional' THEN claim_id END) AS outpatient_claims
    FROM {claims}
    WHERE EXTRACT(YEAR FROM claim_start_date) = {year}
    GROUP BY person_id
    HAVING total_paid >= {threshold}
    ORDER BY total_paid DESC
    LIMIT {limit}
)
SELECT
    pc.*,
    EXTRACT(YEAR FROM p.birth_date) AS birth_year,
    p.sex AS gender,
    p.age
FROM patient_costs pc
JOIN {patient} p ON pc.person_id = p.person_id
ORDER BY pc.total_paid DESC",
        claims = q.table("core.medical_claim"),
        year = p.year.value(),
        threshold = p.cost_threshold,
        limit = p.limit,
        patient = q.table("core.patient"),
    )
}

pub fn readmissions(q: &QueryBuilder, p: &ReadmissionsParams) -> String {
    let mut filter_clause = format!("WHERE {}", year_prefix("encounter_start_date", p.year));
    if let Some(category) = filter(&p.condition_category) {
        filter_clause.push_str(&format!(
            " AND primary_diagnosis_description LIKE {}",
            like_contains(category)
        ));
    }
    format!(
        "SELECT
    COUNT(DISTINCT encounter_id) AS total_encounters,
    COUNT(DISTINCT CASE WHEN readmission_flag = 1 THEN encounter_id END) AS readmissions,
    SAFE_DIVIDE(COUNT(DISTINCT CASE WHEN readmission_flag = 1 THEN encounter_id END), COUNT(DISTINCT encounter_id)) * 100 AS readmission_rate,
    AVG(length_of_stay) AS avg_los,
    SUM(total_paid) AS total_cost
FROM {encounters}
{filter}",
        encounters = q.table("readmissions.encounter_augmented"),
        filter = filter_clause,
    )
}

pub fn hcc_risk_scores(q: &QueryBuilder, p: &HccRiskParams) -> String {
    format!(
        "SELECT
    person_id,
    blended_risk_score AS hcc_risk_score,
    member_months
FROM {scores}
WHERE payment_year = {year}
  AND blended_risk_score IS NOT NULL
ORDER BY blended_risk_score DESC
LIMIT {limit}",
        scores = q.table("cms_hcc.patient_risk_scores"),
        year = p.year.value(),
        limit = p.limit,
    )
}

/// Connectivity probe.
pub fn connectivity_probe() -> &'static str {
    "SELECT 1 AS test_value"
}

/// Row count of the core patient table.
pub fn patient_count(q: &QueryBuilder) -> String {
    format!(
        "SELECT COUNT(*) AS patient_count FROM {}",
        q.table("core.patient")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::params::from_args;
    use serde_json::json;

    fn q() -> QueryBuilder {
        QueryBuilder::new("tuva-demo.")
    }

    #[test]
    fn test_demographics_dates_and_tables() {
        let p = DemographicsParams::default();
        let sql = demographics_summary(&q(), &p);
        assert!(sql.contains("FROM `tuva-demo.core.patient` p"));
        assert!(sql.contains("INNER JOIN `tuva-demo.core.eligibility` e"));
        assert!(sql.contains("e.enrollment_start_date <= '2018-12-31'"));
        assert!(sql.contains("e.enrollment_end_date >= '2018-01-01'"));

        let sql = demographics_age_groups(&q(), &p);
        assert!(sql.contains("p.age_group IS NOT NULL"));
        assert!(sql.contains("GROUP BY p.age_group"));
    }

    #[test]
    fn test_utilization_category_filter_is_quoted() {
        let p: UtilizationParams =
            from_args(&json!({"service_category": "Inpatient' OR '1'='1"})).unwrap();
        let sql = utilization_summary(&q(), &p);
        assert!(sql.contains(
            "WHERE claim_start_date BETWEEN '2018-01-01' AND '2018-12-31' AND service_category_1 = 'Inpatient\\' OR \\'1\\'=\\'1'"
        ));
        let sql = utilization_top_categories(&q(), &p);
        assert!(sql.contains("LIMIT 10"));
    }

    #[test]
    fn test_utilization_without_category() {
        let sql = utilization_summary(&q(), &UtilizationParams::default());
        assert!(!sql.contains("service_category_1 ="));
    }

    #[test]
    fn test_pmpm_uses_year_month_bounds() {
        let p: PmpmParams = from_args(&json!({
            "start_date": "2018-03-15",
            "end_date": "2019-02-01",
            "payer": "Medicare"
        }))
        .unwrap();
        let sql = pmpm_summary(&q(), &p);
        assert!(sql.contains("WHERE year_month BETWEEN '2018-03' AND '2019-02' AND payer = 'Medicare'"));
        assert!(pmpm_monthly_trends(&q(), &p).contains("GROUP BY year_month"));
    }

    #[test]
    fn test_quality_single_and_all() {
        let sql = quality_measure(&q(), "cqm_130");
        assert!(sql.contains("COUNT(DISTINCT person_id) AS total_patients"));
        assert!(sql.contains("SUM(CASE WHEN cqm_130 = 1 THEN 1 ELSE 0 END) AS numerator"));
        assert!(!sql.contains("measure_name"));

        let sql = quality_all_measures(&q());
        assert_eq!(sql.matches("UNION ALL").count(), 4);
        for m in QUALITY_MEASURES {
            assert!(sql.contains(&format!("'{}' AS measure_name", m)));
        }
        assert!(sql.ends_with("ORDER BY measure_name"));
    }

    #[test]
    fn test_chronic_conditions_year_and_family() {
        let p: ChronicConditionsParams =
            from_args(&json!({"year": "2020", "condition_category": "Cardiovascular"})).unwrap();
        let sql = chronic_conditions(&q(), &p);
        assert_eq!(
            sql.matches("CAST(condition_date AS STRING) LIKE '2020%'").count(),
            2
        );
        assert!(sql.contains("AND condition_family = 'Cardiovascular'"));
        assert!(sql.contains("FROM `tuva-demo.core.condition`"));
        assert!(sql.contains("LIMIT 20"));
    }

    #[test]
    fn test_high_cost_numbers() {
        let p: HighCostParams =
            from_args(&json!({"cost_threshold": 25000.5, "year": 2019, "limit": 5})).unwrap();
        let sql = high_cost_patients(&q(), &p);
        assert!(sql.contains("EXTRACT(YEAR FROM claim_start_date) = 2019"));
        assert!(sql.contains("HAVING total_paid >= 25000.5"));
        assert!(sql.contains("LIMIT 5\n"));

        let sql = high_cost_patients(&q(), &HighCostParams::default());
        assert!(sql.contains("HAVING total_paid >= 10000"));
    }

    #[test]
    fn test_readmissions_like_filter() {
        let p: ReadmissionsParams =
            from_args(&json!({"condition_category": "heart failure"})).unwrap();
        let sql = readmissions(&q(), &p);
        assert!(sql.contains("CAST(encounter_start_date AS STRING) LIKE '2018%'"));
        assert!(sql.contains("primary_diagnosis_description LIKE '%heart failure%'"));
    }

    #[test]
    fn test_hcc() {
        let sql = hcc_risk_scores(&q(), &HccRiskParams::default());
        assert!(sql.contains("WHERE payment_year = 2018"));
        assert!(sql.contains("LIMIT 1000"));
    }
}
