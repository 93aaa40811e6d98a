use super::ui;
use crate::core::query::Summary;

impl Summary {
    pub fn display(&self) -> String {
        let total = ui::format_thousands(self.total, 0);
        let (average, average_style) = match self.average {
            Some(average) => (ui::format_thousands(average, 2), ui::StyleType::TotalValue),
            None => ("N/A".to_string(), ui::StyleType::Error),
        };

        format!(
            "Total {}: {}\nAverage {}: {}",
            ui::style_text(&self.total_metric, ui::StyleType::TotalLabel),
            ui::style_text(&total, ui::StyleType::TotalValue),
            ui::style_text(&self.average_metric, ui::StyleType::TotalLabel),
            ui::style_text(&average, average_style)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display() {
        console::set_colors_enabled(false);
        let summary = Summary {
            total_metric: "Population".to_string(),
            total: 38972230.0,
            average_metric: "Net Migration".to_string(),
            average: Some(-8082.456),
        };

        assert_eq!(
            summary.display(),
            "Total Population: 38,972,230\nAverage Net Migration: -8,082.46"
        );
    }

    #[test]
    fn test_summary_display_without_average() {
        console::set_colors_enabled(false);
        let summary = Summary {
            total_metric: "Population".to_string(),
            total: 0.0,
            average_metric: "Net Migration".to_string(),
            average: None,
        };

        assert!(summary.display().ends_with("Average Net Migration: N/A"));
    }
}
