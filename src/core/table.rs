//! Normalizes raw series into typed tables and joins them on `(entity_code, year)`.
use crate::core::metric::{MetricSeries, SeriesRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// One observation of a single metric. No field is ever null.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub entity_code: String,
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricTable {
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// A row of the merged table. `values` is aligned with
/// [`MergedTable::metrics`]; a missing metric is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub entity_code: String,
    pub year: i32,
    pub values: Vec<Option<f64>>,
}

/// Outer join of several metric tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedTable {
    metrics: Vec<String>,
    rows: Vec<MergedRow>,
}

impl MergedTable {
    pub(crate) fn from_parts(metrics: Vec<String>, rows: Vec<MergedRow>) -> Self {
        Self { metrics, rows }
    }

    /// Metric names in column order.
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Column names: `entity_code`, `year`, then `value_<metric>` per metric.
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = vec!["entity_code".to_string(), "year".to_string()];
        columns.extend(self.metrics.iter().map(|m| value_column(m)));
        columns
    }

    pub fn metric_index(&self, metric: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m == metric)
    }

    pub fn get(&self, entity_code: &str, year: i32) -> Option<&MergedRow> {
        self.rows
            .iter()
            .find(|r| r.entity_code == entity_code && r.year == year)
    }

    /// Value of `metric` at `(entity_code, year)`. `None` when the key, the
    /// metric or the observation is absent.
    pub fn value(&self, entity_code: &str, year: i32, metric: &str) -> Option<f64> {
        let index = self.metric_index(metric)?;
        self.get(entity_code, year)
            .and_then(|row| row.values.get(index).copied().flatten())
    }
}

pub fn value_column(metric: &str) -> String {
    format!("value_{metric}")
}

/// Projects raw records onto `(entity_code, year, value)`, dropping any
/// record with a missing or unparsable field.
pub fn normalize(series: &MetricSeries) -> MetricTable {
    if series.is_empty() {
        return MetricTable::default();
    }

    let rows: Vec<MetricRow> = series.records.iter().filter_map(normalize_record).collect();

    let dropped = series.len() - rows.len();
    if dropped > 0 {
        debug!(
            metric = %series.metric_id,
            dropped,
            kept = rows.len(),
            "Dropped records with missing or invalid fields"
        );
    }

    MetricTable { rows }
}

fn normalize_record(record: &SeriesRecord) -> Option<MetricRow> {
    let entity_code = record
        .entity_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())?;
    let year = parse_year(record.year.as_ref()?)?;
    let value = parse_value(record.value.as_ref()?)?;

    Some(MetricRow {
        entity_code: entity_code.to_string(),
        year,
        value,
    })
}

fn parse_year(raw: &Value) -> Option<i32> {
    match raw {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        _ => None,
    }
}

fn parse_value(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// Full outer join of `tables` on `(entity_code, year)`.
///
/// Column order follows the input order. An empty table still gets a column,
/// filled with `None`. Rows come out sorted by key, but callers should look
/// rows up by key rather than position.
pub fn merge(tables: &[(String, MetricTable)]) -> MergedTable {
    let metrics: Vec<String> = tables.iter().map(|(name, _)| name.clone()).collect();
    let width = metrics.len();
    let mut joined: BTreeMap<(String, i32), Vec<Option<f64>>> = BTreeMap::new();

    for (index, (name, table)) in tables.iter().enumerate() {
        for row in &table.rows {
            let values = joined
                .entry((row.entity_code.clone(), row.year))
                .or_insert_with(|| vec![None; width]);
            if values[index].is_some() {
                warn!(
                    metric = %name,
                    entity_code = %row.entity_code,
                    year = row.year,
                    "Duplicate key in metric table, keeping first value"
                );
                continue;
            }
            values[index] = Some(row.value);
        }
    }

    let rows = joined
        .into_iter()
        .map(|((entity_code, year), values)| MergedRow {
            entity_code,
            year,
            values,
        })
        .collect();

    MergedTable::from_parts(metrics, rows)
}
