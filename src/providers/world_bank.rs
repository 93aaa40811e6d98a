use crate::core::metric::{
    FetchDiagnostic, FetchOutcome, MetricProvider, MetricSeries, SeriesRecord,
};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";
pub const DEFAULT_PER_PAGE: u32 = 5000;

/// Fetches indicator series from the World Bank v2 API.
pub struct WorldBankProvider {
    base_url: String,
    per_page: u32,
}

impl WorldBankProvider {
    pub fn new(base_url: &str, per_page: u32) -> Self {
        WorldBankProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            per_page,
        }
    }

    fn request_url(
        &self,
        entity_codes: &[String],
        metric_id: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Url> {
        let url = format!(
            "{}/country/{}/indicator/{}",
            self.base_url,
            entity_codes.join(";"),
            metric_id
        );
        Url::parse_with_params(
            &url,
            &[
                ("format", "json".to_string()),
                ("date", format!("{start_year}:{end_year}")),
                ("per_page", self.per_page.to_string()),
            ],
        )
        .with_context(|| format!("Invalid request URL: {url}"))
    }
}

impl Default for WorldBankProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_PER_PAGE)
    }
}

/// Paging fields of the envelope metadata. The API sends some of them as
/// strings, so every field is read leniently.
#[derive(Debug, Default, Deserialize)]
struct PageMetadata {
    #[serde(default, deserialize_with = "lenient_count")]
    pages: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    total: Option<u64>,
}

impl PageMetadata {
    /// Total record count when the response holds only part of the result.
    fn truncated(&self, received: usize) -> Option<u64> {
        let total = self.total.unwrap_or(received as u64);
        let more_pages = self.pages.is_some_and(|pages| pages > 1);
        (more_pages || total > received as u64).then_some(total)
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Extracts the records from a `[metadata, records]` envelope.
fn parse_envelope(metric_id: &str, body: &str) -> FetchOutcome {
    let envelope: Vec<Value> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return FetchOutcome::no_data(FetchDiagnostic::Malformed {
                metric_id: metric_id.to_string(),
                message: e.to_string(),
            });
        }
    };

    let mut envelope = envelope.into_iter();
    let paging = envelope
        .next()
        .and_then(|metadata| serde_json::from_value::<PageMetadata>(metadata).ok())
        .unwrap_or_default();

    let records = match envelope.next() {
        Some(Value::Array(records)) => records,
        Some(Value::Null) => Vec::new(),
        Some(other) => {
            return FetchOutcome::no_data(FetchDiagnostic::Malformed {
                metric_id: metric_id.to_string(),
                message: format!("expected a records array, found {other}"),
            });
        }
        None => {
            return FetchOutcome::no_data(FetchDiagnostic::NoData {
                metric_id: metric_id.to_string(),
            });
        }
    };

    let received = records.len();
    let records: Vec<SeriesRecord> = records
        .into_iter()
        .filter_map(|r| match serde_json::from_value(r) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(metric_id, error = %e, "Skipping unreadable record");
                None
            }
        })
        .collect();
    debug!(
        metric_id,
        received,
        parsed = records.len(),
        pages = ?paging.pages,
        total = ?paging.total,
        "Parsed indicator records"
    );

    let series = MetricSeries {
        metric_id: metric_id.to_string(),
        records,
    };
    match paging.truncated(received) {
        Some(total) => FetchOutcome {
            series,
            diagnostic: Some(FetchDiagnostic::Truncated {
                metric_id: metric_id.to_string(),
                total,
                received,
            }),
        },
        None => FetchOutcome::data(series),
    }
}

#[async_trait]
impl MetricProvider for WorldBankProvider {
    #[instrument(
        name = "WorldBankFetch",
        skip(self, entity_codes),
        fields(metric_id = %metric_id)
    )]
    async fn fetch(
        &self,
        entity_codes: &[String],
        metric_id: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<FetchOutcome> {
        if entity_codes.is_empty() {
            bail!("At least one entity code is required for indicator {metric_id}");
        }
        if start_year > end_year {
            bail!("Invalid year range {start_year}:{end_year} for indicator {metric_id}");
        }

        let url = self.request_url(entity_codes, metric_id, start_year, end_year)?;
        debug!("Requesting indicator data from {}", url);

        let client = reqwest::Client::builder()
            .user_agent(concat!("wbdash/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let outcome = match client.get(url).send().await {
            Err(e) => FetchOutcome::no_data(FetchDiagnostic::Transport {
                metric_id: metric_id.to_string(),
                message: e.to_string(),
            }),
            Ok(response) if !response.status().is_success() => {
                FetchOutcome::no_data(FetchDiagnostic::HttpStatus {
                    metric_id: metric_id.to_string(),
                    status: response.status().as_u16(),
                })
            }
            Ok(response) => match response.text().await {
                Ok(body) => parse_envelope(metric_id, &body),
                Err(e) => FetchOutcome::no_data(FetchDiagnostic::Transport {
                    metric_id: metric_id.to_string(),
                    message: e.to_string(),
                }),
            },
        };

        if let Some(diagnostic) = &outcome.diagnostic {
            warn!(metric_id, "{diagnostic}");
        }
        Ok(outcome)
    }
}
