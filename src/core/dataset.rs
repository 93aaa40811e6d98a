//! Builds the merged table once at startup.
use crate::core::config::AppConfig;
use crate::core::metric::{FetchDiagnostic, MetricProvider};
use crate::core::table::{self, MergedTable};
use anyhow::Result;
use tracing::{debug, info};

/// The merged table for every configured metric, plus whatever went wrong
/// while fetching it. Read-only after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub table: MergedTable,
    pub diagnostics: Vec<FetchDiagnostic>,
}

/// Fetches each configured metric in order, normalizes it and merges the
/// results. A metric without data still contributes an empty column.
pub async fn load_dataset(
    config: &AppConfig,
    provider: &(dyn MetricProvider + Send + Sync),
    on_metric_done: &(dyn Fn(&str)),
) -> Result<Dataset> {
    let codes = config.country_codes();
    let mut tables = Vec::with_capacity(config.metrics.len());
    let mut diagnostics = Vec::new();

    for metric in &config.metrics {
        let outcome = provider
            .fetch(&codes, &metric.indicator, config.start_year, config.end_year)
            .await?;
        let normalized = table::normalize(&outcome.series);
        debug!(
            metric = %metric.name,
            raw = outcome.series.len(),
            rows = normalized.len(),
            "Normalized metric"
        );
        if let Some(diagnostic) = outcome.diagnostic {
            diagnostics.push(diagnostic);
        }
        tables.push((metric.name.clone(), normalized));
        on_metric_done(&metric.name);
    }

    let table = table::merge(&tables);
    info!(
        rows = table.len(),
        metrics = table.metrics().len(),
        "Dataset ready"
    );
    Ok(Dataset { table, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metric::{FetchOutcome, MetricSeries, SeriesRecord};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockMetricProvider {
        series: HashMap<String, Vec<SeriesRecord>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockMetricProvider {
        fn new() -> Self {
            MockMetricProvider {
                series: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn add(&mut self, metric_id: &str, rows: &[(&str, &str, Option<f64>)]) {
            let records = rows
                .iter()
                .map(|(code, year, value)| SeriesRecord {
                    entity_code: Some(code.to_string()),
                    year: Some(json!(year)),
                    value: value.map(|v| json!(v)),
                })
                .collect();
            self.series.insert(metric_id.to_string(), records);
        }
    }

    #[async_trait]
    impl MetricProvider for MockMetricProvider {
        async fn fetch(
            &self,
            entity_codes: &[String],
            metric_id: &str,
            _start_year: i32,
            _end_year: i32,
        ) -> Result<FetchOutcome> {
            if entity_codes.is_empty() {
                return Err(anyhow!("no codes"));
            }
            self.calls.lock().unwrap().push(metric_id.to_string());
            Ok(match self.series.get(metric_id) {
                Some(records) => FetchOutcome::data(MetricSeries {
                    metric_id: metric_id.to_string(),
                    records: records.clone(),
                }),
                None => FetchOutcome::no_data(FetchDiagnostic::HttpStatus {
                    metric_id: metric_id.to_string(),
                    status: 500,
                }),
            })
        }
    }

    fn config() -> AppConfig {
        serde_yaml::from_str(
            r#"
countries:
  - code: AFG
    name: Afghanistan
  - code: IND
    name: India
metrics:
  - name: Population
    indicator: SP.POP.TOTL
  - name: Net Migration
    indicator: SM.POP.NETM
start_year: 2019
end_year: 2020
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_dataset_merges_metrics_in_order() {
        let mut provider = MockMetricProvider::new();
        provider.add(
            "SP.POP.TOTL",
            &[("AFG", "2020", Some(38972230.0)), ("IND", "2020", Some(1.4e9))],
        );
        provider.add(
            "SM.POP.NETM",
            &[("AFG", "2020", Some(166821.0)), ("IND", "2019", None)],
        );

        let dataset = load_dataset(&config(), &provider, &|_| ()).await.unwrap();

        assert!(dataset.diagnostics.is_empty());
        assert_eq!(
            *provider.calls.lock().unwrap(),
            vec!["SP.POP.TOTL", "SM.POP.NETM"]
        );
        assert_eq!(dataset.table.metrics(), ["Population", "Net Migration"]);
        assert_eq!(dataset.table.len(), 2);
        assert_eq!(
            dataset.table.value("AFG", 2020, "Net Migration"),
            Some(166821.0)
        );
        assert_eq!(dataset.table.value("IND", 2020, "Net Migration"), None);
        assert!(dataset.table.get("IND", 2019).is_none());
    }

    #[tokio::test]
    async fn test_load_dataset_survives_failed_metric() {
        let mut provider = MockMetricProvider::new();
        provider.add(
            "SP.POP.TOTL",
            &[("AFG", "2020", Some(1.0)), ("IND", "2020", Some(2.0))],
        );

        let done = Mutex::new(Vec::new());
        let dataset = load_dataset(&config(), &provider, &|name| {
            done.lock().unwrap().push(name.to_string())
        })
        .await
        .unwrap();

        assert_eq!(*done.lock().unwrap(), vec!["Population", "Net Migration"]);
        assert_eq!(dataset.diagnostics.len(), 1);
        assert_eq!(dataset.diagnostics[0].metric_id(), "SM.POP.NETM");
        assert_eq!(dataset.table.len(), 2);
        assert!(
            dataset
                .table
                .rows()
                .iter()
                .all(|r| r.values[0].is_some() && r.values[1].is_none())
        );
    }
}
