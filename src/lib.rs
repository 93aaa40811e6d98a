pub mod cli;
pub mod core;
pub mod providers;

pub use crate::core::config;

use crate::core::{Dataset, Filter, load_dataset};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Dashboard { limit: Option<usize> },
    Table { limit: Option<usize> },
    Summary,
    Export { output: Option<PathBuf> },
}

/// Entities and years a command should look at. Empty or missing parts
/// fall back to the configured countries and year range.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub countries: Vec<String>,
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl Selection {
    pub fn to_filter(&self, config: &config::AppConfig) -> Filter {
        let codes = if self.countries.is_empty() {
            config.country_codes()
        } else {
            self.countries
                .iter()
                .map(|c| c.trim().to_uppercase())
                .collect()
        };
        for code in &codes {
            if config.country_name(code).is_none() {
                warn!(code = %code, "Country is not configured and will match no rows");
            }
        }
        Filter::new(
            codes,
            self.from.unwrap_or(config.start_year),
            self.to.unwrap_or(config.end_year),
        )
    }
}

/// Loads the dataset for `config` from its configured World Bank endpoint.
pub async fn load(config: &config::AppConfig) -> Result<Dataset> {
    let (base_url, per_page) = config.world_bank_provider();
    let provider = providers::world_bank::WorldBankProvider::new(base_url, per_page);

    let pb = cli::ui::new_progress_bar(config.metrics.len() as u64, true);
    pb.set_message("Fetching indicators...");
    let dataset = load_dataset(config, &provider, &|_| pb.inc(1)).await;
    pb.finish_and_clear();
    dataset
}

pub async fn run_command(
    command: AppCommand,
    selection: &Selection,
    config_path: Option<&str>,
) -> Result<()> {
    info!("wbdash starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let dataset = load(&config).await?;
    for diagnostic in &dataset.diagnostics {
        eprintln!(
            "{}",
            cli::ui::style_text(&diagnostic.to_string(), cli::ui::StyleType::Error)
        );
    }

    let filter = selection.to_filter(&config);
    debug!(?filter, "Applying filter");
    let filtered = dataset.table.filter(&filter);

    match command {
        AppCommand::Dashboard { limit } => cli::dashboard::run(&filtered, &config, limit),
        AppCommand::Table { limit } => {
            println!("{}", filtered.display_as_table(limit));
            Ok(())
        }
        AppCommand::Summary => {
            let summary = crate::core::query::summarize(
                &filtered,
                config.total_metric(),
                config.average_metric(),
            )?;
            println!("{}", summary.display());
            Ok(())
        }
        AppCommand::Export { output } => cli::export::run(&filtered, output.as_deref()),
    }
}
