//! Tabular query results.
//!
//! A [`Frame`] is what the warehouse hands back: column names plus rows of
//! JSON cells. Tools reshape frames into response dictionaries either by
//! taking rows as records or by aggregating a numeric column.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A query result: named columns and row-major cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first row as a `column -> value` object, empty when there are no rows.
    pub fn first_record(&self) -> Map<String, Value> {
        self.rows
            .first()
            .map(|row| self.record(row))
            .unwrap_or_default()
    }

    /// All rows as `column -> value` objects.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows.iter().map(|row| self.record(row)).collect()
    }

    /// [`records`](Self::records) as a JSON array.
    pub fn records_value(&self) -> Value {
        Value::Array(self.records().into_iter().map(Value::Object).collect())
    }

    fn record(&self, row: &[Value]) -> Map<String, Value> {
        self.columns
            .iter()
            .zip(row.iter())
            .map(|(col, val)| (col.clone(), val.clone()))
            .collect()
    }

    /// Numeric cells of `column`, skipping nulls and non-numeric values.
    pub fn column_f64(&self, column: &str) -> Vec<f64> {
        let Some(idx) = self.columns.iter().position(|c| c == column) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| row.get(idx))
            .filter_map(|cell| match cell {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse::<f64>().ok(),
                _ => None,
            })
            .filter(|v| v.is_finite())
            .collect()
    }
}

/// Summary statistics over a numeric column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnStats<'a> {
    values: &'a [f64],
}

impl<'a> ColumnStats<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        Self { values }
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().fold(0.0, |acc, v| acc + v)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum() / self.values.len() as f64)
        }
    }

    pub fn median(&self) -> Option<f64> {
        self.quantile(0.5)
    }

    /// Sample standard deviation (n - 1 denominator).
    pub fn std(&self) -> Option<f64> {
        let n = self.values.len();
        if n < 2 {
            return None;
        }
        let mean = self.mean()?;
        let var = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        Some(var.sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Quantile `q` in `[0, 1]`, linearly interpolated between closest ranks.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mut sorted = self.values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
    }

    pub fn count_where<F>(&self, pred: F) -> usize
    where
        F: Fn(f64) -> bool,
    {
        self.values.iter().filter(|v| pred(**v)).count()
    }

    /// `count`, `mean`, `std`, `min`, quartiles and `max` as a JSON object.
    pub fn describe(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("count".to_string(), Value::from(self.count()));
        out.insert("mean".to_string(), opt_number(self.mean()));
        out.insert("std".to_string(), opt_number(self.std()));
        out.insert("min".to_string(), opt_number(self.min()));
        out.insert("25%".to_string(), opt_number(self.quantile(0.25)));
        out.insert("50%".to_string(), opt_number(self.quantile(0.5)));
        out.insert("75%".to_string(), opt_number(self.quantile(0.75)));
        out.insert("max".to_string(), opt_number(self.max()));
        out
    }
}

/// A finite float as a JSON number, anything else as `null`.
pub fn number(value: f64) -> Value {
    Value::from(value)
}

fn opt_number(value: Option<f64>) -> Value {
    value.map(number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Frame {
        Frame::new(
            vec!["person_id".into(), "total_paid".into()],
            vec![
                vec![json!("p1"), json!(120.5)],
                vec![json!("p2"), json!("79.5")],
                vec![json!("p3"), Value::Null],
            ],
        )
    }

    #[test]
    fn test_first_record_and_records() {
        let frame = sample();
        let first = frame.first_record();
        assert_eq!(first["person_id"], "p1");
        assert_eq!(first["total_paid"], 120.5);

        let records = frame.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2]["total_paid"], Value::Null);
        assert_eq!(frame.records_value()[1]["person_id"], "p2");
    }

    #[test]
    fn test_empty_frame() {
        let frame = Frame::default();
        assert!(frame.is_empty());
        assert!(frame.first_record().is_empty());
        assert!(frame.records().is_empty());
    }

    #[test]
    fn test_column_f64_skips_nulls_and_unknown_columns() {
        let frame = sample();
        assert_eq!(frame.column_f64("total_paid"), vec![120.5, 79.5]);
        assert!(frame.column_f64("missing").is_empty());
        assert!(frame.column_f64("person_id").is_empty());
    }

    #[test]
    fn test_stats_basic() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let stats = ColumnStats::new(&values);
        assert_eq!(stats.sum(), 10.0);
        assert_eq!(stats.mean(), Some(2.5));
        assert_eq!(stats.median(), Some(2.5));
        assert_eq!(stats.min(), Some(1.0));
        assert_eq!(stats.max(), Some(4.0));
        assert_eq!(stats.quantile(0.25), Some(1.75));
        assert_eq!(stats.quantile(0.75), Some(3.25));
        assert_eq!(stats.count_where(|v| v > 2.0), 2);
        let std = stats.std().unwrap();
        assert!((std - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn test_stats_unsorted_odd() {
        let values = [3.2, 0.4, 1.1];
        let stats = ColumnStats::new(&values);
        assert_eq!(stats.median(), Some(1.1));
    }

    #[test]
    fn test_describe_single_value_has_null_std() {
        let values = [2.5];
        let described = ColumnStats::new(&values).describe();
        assert_eq!(described["count"], 1);
        assert_eq!(described["mean"], 2.5);
        assert_eq!(described["std"], Value::Null);
        assert_eq!(described["50%"], 2.5);
        assert_eq!(described.len(), 8);
    }

    #[test]
    fn test_empty_stats() {
        let stats = ColumnStats::new(&[]);
        assert_eq!(stats.mean(), None);
        assert_eq!(stats.median(), None);
        assert_eq!(stats.sum(), 0.0);
        assert_eq!(stats.describe()["min"], Value::Null);
    }

    #[test]
    fn test_number_non_finite_is_null() {
        assert_eq!(number(f64::NAN), Value::Null);
        assert_eq!(number(f64::INFINITY), Value::Null);
        assert_eq!(number(1.5), json!(1.5));
    }
}
