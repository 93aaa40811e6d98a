use super::{table, ui};
use crate::core::config::AppConfig;
use crate::core::{MergedTable, query};
use anyhow::Result;

/// Rows of the data table shown when no limit is given.
pub const DEFAULT_ROW_LIMIT: usize = 10;

/// Prints the summary, one grid per metric, the scatter view and the
/// first `limit` filtered rows.
pub fn run(filtered: &MergedTable, config: &AppConfig, limit: Option<usize>) -> Result<()> {
    let total_metric = config.total_metric();
    let average_metric = config.average_metric();

    let summary = query::summarize(filtered, total_metric, average_metric)?;
    println!("{}", summary.display());

    let label = |code: &str| match config.country_name(code) {
        Some(name) => format!("{name} ({code})"),
        None => code.to_string(),
    };

    for metric in filtered.metrics() {
        ui::print_separator();
        println!(
            "{}\n",
            ui::style_text(&format!("{metric} Over the Years"), ui::StyleType::Title)
        );
        let series = query::line_series(filtered, metric)?;
        if series.is_empty() {
            println!("{}", ui::style_text("No data", ui::StyleType::Subtle));
        } else {
            println!("{}", table::display_line_series(&series, &label));
        }
    }

    if total_metric != average_metric {
        ui::print_separator();
        println!(
            "{}\n",
            ui::style_text(
                &format!("{average_metric} vs. {total_metric}"),
                ui::StyleType::Title
            )
        );
        let points = query::scatter_points(filtered, total_metric, average_metric)?;
        if points.is_empty() {
            println!("{}", ui::style_text("No data", ui::StyleType::Subtle));
        } else {
            println!(
                "{}",
                table::display_scatter(&points, total_metric, average_metric)
            );
        }
    }

    ui::print_separator();
    println!(
        "{}\n",
        ui::style_text("Filtered Data", ui::StyleType::Title)
    );
    println!(
        "{}",
        filtered.display_as_table(Some(limit.unwrap_or(DEFAULT_ROW_LIMIT)))
    );
    Ok(())
}
