//! Read-only views over a [`MergedTable`]: filtering, chart series, summary
//! statistics and CSV export.
use crate::core::table::MergedTable;
use anyhow::{Context, Result, anyhow};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

/// Selection of entities and an inclusive year range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub entity_codes: BTreeSet<String>,
    pub year_range: (i32, i32),
}

impl Filter {
    pub fn new<I, S>(entity_codes: I, start_year: i32, end_year: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity_codes: entity_codes.into_iter().map(Into::into).collect(),
            year_range: (start_year, end_year),
        }
    }

    pub fn matches(&self, entity_code: &str, year: i32) -> bool {
        let (start, end) = self.year_range;
        self.entity_codes.contains(entity_code) && start <= year && year <= end
    }
}

impl MergedTable {
    /// Returns the rows matching `filter` as a new table. `self` is untouched.
    pub fn filter(&self, filter: &Filter) -> MergedTable {
        let rows = self
            .rows()
            .iter()
            .filter(|r| filter.matches(&r.entity_code, r.year))
            .cloned()
            .collect();
        MergedTable::from_parts(self.metrics().to_vec(), rows)
    }
}

/// Value-over-year points of one metric for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub entity_code: String,
    pub points: Vec<(i32, f64)>,
}

/// Both metrics observed for the same entity and year.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub entity_code: String,
    pub year: i32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_metric: String,
    pub total: f64,
    pub average_metric: String,
    pub average: Option<f64>,
}

fn metric_index(table: &MergedTable, metric: &str) -> Result<usize> {
    table
        .metric_index(metric)
        .ok_or_else(|| anyhow!("Unknown metric: {}", metric))
}

/// One series per entity, points ascending by year, missing values skipped.
pub fn line_series(table: &MergedTable, metric: &str) -> Result<Vec<LineSeries>> {
    let index = metric_index(table, metric)?;
    let mut by_entity: BTreeMap<&str, Vec<(i32, f64)>> = BTreeMap::new();

    for row in table.rows() {
        if let Some(value) = row.values[index] {
            by_entity
                .entry(row.entity_code.as_str())
                .or_default()
                .push((row.year, value));
        }
    }

    Ok(by_entity
        .into_iter()
        .map(|(entity_code, mut points)| {
            points.sort_by_key(|(year, _)| *year);
            LineSeries {
                entity_code: entity_code.to_string(),
                points,
            }
        })
        .collect())
}

pub fn scatter_points(
    table: &MergedTable,
    x_metric: &str,
    y_metric: &str,
) -> Result<Vec<ScatterPoint>> {
    let x_index = metric_index(table, x_metric)?;
    let y_index = metric_index(table, y_metric)?;

    Ok(table
        .rows()
        .iter()
        .filter_map(|row| match (row.values[x_index], row.values[y_index]) {
            (Some(x), Some(y)) => Some(ScatterPoint {
                entity_code: row.entity_code.clone(),
                year: row.year,
                x,
                y,
            }),
            _ => None,
        })
        .collect())
}

/// Sum of `total_metric` and mean of `average_metric`, skipping missing
/// values. An empty sum is zero; an empty mean is `None`.
pub fn summarize(table: &MergedTable, total_metric: &str, average_metric: &str) -> Result<Summary> {
    let total_index = metric_index(table, total_metric)?;
    let average_index = metric_index(table, average_metric)?;

    let total: f64 = table
        .rows()
        .iter()
        .filter_map(|r| r.values[total_index])
        .sum();

    let observed: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|r| r.values[average_index])
        .collect();
    let average =
        (!observed.is_empty()).then(|| observed.iter().sum::<f64>() / observed.len() as f64);

    Ok(Summary {
        total_metric: total_metric.to_string(),
        total,
        average_metric: average_metric.to_string(),
        average,
    })
}

/// Writes the table as CSV with a header row. Missing values are empty cells.
pub fn write_csv<W: Write>(table: &MergedTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(table.column_names())
        .context("Failed to write CSV header")?;

    for row in table.rows() {
        let mut record = vec![row.entity_code.clone(), row.year.to_string()];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map_or(String::new(), |v| v.to_string())),
        );
        csv_writer
            .write_record(&record)
            .with_context(|| {
                format!("Failed to write CSV row for {} {}", row.entity_code, row.year)
            })?;
    }

    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}
