use crate::providers::world_bank::{DEFAULT_BASE_URL, DEFAULT_PER_PAGE};
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CountryConfig {
    #[serde(deserialize_with = "country_code")]
    pub code: String,
    pub name: String,
}

/// Country codes are matched against the API's upper-case ISO3 codes.
fn country_code<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let code = String::deserialize(deserializer)?;
    Ok(code.trim().to_uppercase())
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricConfig {
    pub name: String,
    pub indicator: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WorldBankProviderConfig {
    pub base_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub world_bank: Option<WorldBankProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            world_bank: Some(WorldBankProviderConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                per_page: DEFAULT_PER_PAGE,
            }),
        }
    }
}

/// Metrics used by the summary line and the scatter view.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ViewsConfig {
    pub total: Option<String>,
    pub average: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub countries: Vec<CountryConfig>,
    pub metrics: Vec<MetricConfig>,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub views: ViewsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "wbdash", "wbdash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.countries.is_empty() {
            bail!("At least one country must be configured");
        }
        if self.metrics.is_empty() {
            bail!("At least one metric must be configured");
        }
        if self.start_year > self.end_year {
            bail!(
                "start_year ({}) must not be after end_year ({})",
                self.start_year,
                self.end_year
            );
        }

        let mut names = HashSet::new();
        for metric in &self.metrics {
            if !names.insert(metric.name.as_str()) {
                bail!("Duplicate metric name: {}", metric.name);
            }
        }

        for view in [&self.views.total, &self.views.average].into_iter().flatten() {
            if !names.contains(view.as_str()) {
                bail!("View refers to unknown metric: {view}");
            }
        }
        Ok(())
    }

    pub fn country_codes(&self) -> Vec<String> {
        self.countries.iter().map(|c| c.code.clone()).collect()
    }

    pub fn country_name(&self, code: &str) -> Option<&str> {
        self.countries
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.name.as_str())
    }

    /// Metric summed in the summary; defaults to the first metric.
    pub fn total_metric(&self) -> &str {
        self.views
            .total
            .as_deref()
            .unwrap_or(self.metrics[0].name.as_str())
    }

    /// Metric averaged in the summary; defaults to the second metric, or the
    /// first when only one is configured.
    pub fn average_metric(&self) -> &str {
        self.views.average.as_deref().unwrap_or_else(|| {
            self.metrics
                .get(1)
                .unwrap_or(&self.metrics[0])
                .name
                .as_str()
        })
    }

    pub fn world_bank_provider(&self) -> (&str, u32) {
        self.providers
            .world_bank
            .as_ref()
            .map_or((DEFAULT_BASE_URL, DEFAULT_PER_PAGE), |p| {
                (p.base_url.as_str(), p.per_page)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
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
start_year: 1960
end_year: 2023
"#;

    #[test]
    fn test_config_deserialization() {
        let config: AppConfig = serde_yaml::from_str(CONFIG).expect("Failed to deserialize");
        config.validate().unwrap();

        assert_eq!(config.country_codes(), vec!["AFG", "IND"]);
        assert_eq!(config.country_name("IND"), Some("India"));
        assert_eq!(config.country_name("PAK"), None);
        assert_eq!(config.metrics[1].indicator, "SM.POP.NETM");
        assert_eq!(config.start_year, 1960);
        assert_eq!(config.end_year, 2023);
        assert_eq!(config.total_metric(), "Population");
        assert_eq!(config.average_metric(), "Net Migration");
        assert_eq!(
            config.world_bank_provider(),
            ("https://api.worldbank.org/v2", 5000)
        );
    }

    #[test]
    fn test_config_with_providers_and_views() {
        let yaml = format!(
            r#"{CONFIG}
providers:
  world_bank:
    base_url: "http://example.com/wb"
views:
  total: Net Migration
  average: Population
"#
        );
        let config: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.world_bank_provider(), ("http://example.com/wb", 5000));
        assert_eq!(config.total_metric(), "Net Migration");
        assert_eq!(config.average_metric(), "Population");
    }

    #[test]
    fn test_country_codes_are_uppercased() {
        let yaml = CONFIG
            .replace("code: AFG", "code: afg")
            .replace("code: IND", "code: ' Ind '");
        let config: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.country_codes(), vec!["AFG", "IND"]);
        assert_eq!(config.country_name("AFG"), Some("Afghanistan"));
        assert_eq!(config.country_name("afg"), None);
    }

    #[test]
    fn test_validation_errors() {
        let mut config: AppConfig = serde_yaml::from_str(CONFIG).unwrap();
        config.start_year = 2030;
        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("must not be after")
        );

        let mut config: AppConfig = serde_yaml::from_str(CONFIG).unwrap();
        config.metrics[1].name = "Population".to_string();
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "Duplicate metric name: Population"
        );

        let mut config: AppConfig = serde_yaml::from_str(CONFIG).unwrap();
        config.countries.clear();
        assert!(config.validate().is_err());

        let mut config: AppConfig = serde_yaml::from_str(CONFIG).unwrap();
        config.views.average = Some("GDP".to_string());
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "View refers to unknown metric: GDP"
        );
    }

    #[test]
    fn test_single_metric_views_fall_back_to_first() {
        let mut config: AppConfig = serde_yaml::from_str(CONFIG).unwrap();
        config.metrics.truncate(1);
        assert_eq!(config.total_metric(), "Population");
        assert_eq!(config.average_metric(), "Population");
    }
}
