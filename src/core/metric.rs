//! Metric abstractions and raw series types

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A single raw observation as returned by the statistics service.
///
/// Every field may be missing or null on the wire; normalization decides
/// what survives.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesRecord {
    #[serde(rename = "countryiso3code", default)]
    pub entity_code: Option<String>,
    #[serde(rename = "date", default)]
    pub year: Option<serde_json::Value>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Raw records fetched for one metric.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricSeries {
    pub metric_id: String,
    pub records: Vec<SeriesRecord>,
}

impl MetricSeries {
    pub fn empty(metric_id: &str) -> Self {
        Self {
            metric_id: metric_id.to_string(),
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Why a fetch returned less data than was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDiagnostic {
    HttpStatus { metric_id: String, status: u16 },
    Transport { metric_id: String, message: String },
    Malformed { metric_id: String, message: String },
    NoData { metric_id: String },
    /// Records were returned, but only part of the result set.
    Truncated {
        metric_id: String,
        total: u64,
        received: usize,
    },
}

impl FetchDiagnostic {
    pub fn metric_id(&self) -> &str {
        match self {
            FetchDiagnostic::HttpStatus { metric_id, .. }
            | FetchDiagnostic::Transport { metric_id, .. }
            | FetchDiagnostic::Malformed { metric_id, .. }
            | FetchDiagnostic::NoData { metric_id }
            | FetchDiagnostic::Truncated { metric_id, .. } => metric_id,
        }
    }
}

impl Display for FetchDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchDiagnostic::HttpStatus { metric_id, status } => write!(
                f,
                "Failed to fetch data for indicator {metric_id}. HTTP status code: {status}"
            ),
            FetchDiagnostic::Transport { metric_id, message } => {
                write!(f, "Request for indicator {metric_id} failed: {message}")
            }
            FetchDiagnostic::Malformed { metric_id, message } => {
                write!(f, "Unreadable response for indicator {metric_id}: {message}")
            }
            FetchDiagnostic::NoData { metric_id } => {
                write!(f, "No data found for indicator {metric_id}")
            }
            FetchDiagnostic::Truncated {
                metric_id,
                total,
                received,
            } => write!(
                f,
                "Only {received} of {total} records loaded for indicator {metric_id}"
            ),
        }
    }
}

/// Result of a fetch. An empty series with a diagnostic means "no data",
/// not a failure to act on. A non-empty series may still carry a
/// diagnostic when the response was truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub series: MetricSeries,
    pub diagnostic: Option<FetchDiagnostic>,
}

impl FetchOutcome {
    pub fn data(series: MetricSeries) -> Self {
        Self {
            series,
            diagnostic: None,
        }
    }

    pub fn no_data(diagnostic: FetchDiagnostic) -> Self {
        Self {
            series: MetricSeries::empty(diagnostic.metric_id()),
            diagnostic: Some(diagnostic),
        }
    }
}

#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Fetches one metric for `entity_codes` over `start_year..=end_year`.
    ///
    /// Only invalid arguments produce an `Err`. Upstream trouble degrades to
    /// an empty or partial series carrying a [`FetchDiagnostic`].
    async fn fetch(
        &self,
        entity_codes: &[String],
        metric_id: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<FetchOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserialization_ignores_extra_fields() {
        let json = r#"{
            "indicator": {"id": "SP.POP.TOTL", "value": "Population, total"},
            "country": {"id": "AF", "value": "Afghanistan"},
            "countryiso3code": "AFG",
            "date": "2020",
            "value": 38972230,
            "unit": "",
            "obs_status": "",
            "decimal": 0
        }"#;

        let record: SeriesRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.entity_code.as_deref(), Some("AFG"));
        assert_eq!(record.year, Some(serde_json::json!("2020")));
        assert_eq!(record.value, Some(serde_json::json!(38972230)));
    }

    #[test]
    fn test_record_null_value() {
        let record: SeriesRecord =
            serde_json::from_str(r#"{"countryiso3code": "IND", "date": "1960", "value": null}"#)
                .unwrap();
        assert!(record.value.is_none());
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = FetchDiagnostic::HttpStatus {
            metric_id: "SM.POP.NETM".to_string(),
            status: 500,
        };
        assert_eq!(
            diag.to_string(),
            "Failed to fetch data for indicator SM.POP.NETM. HTTP status code: 500"
        );

        let outcome = FetchOutcome::no_data(FetchDiagnostic::NoData {
            metric_id: "SP.POP.TOTL".to_string(),
        });
        assert!(outcome.series.is_empty());
        assert_eq!(outcome.series.metric_id, "SP.POP.TOTL");
    }
}
