use super::ui;
use crate::core::MergedTable;
use crate::core::query::{LineSeries, ScatterPoint};
use comfy_table::{Cell, CellAlignment};
use std::collections::BTreeSet;

impl MergedTable {
    /// Renders the rows, one column per metric. With a `limit`, only the
    /// first rows are shown, followed by a count of the hidden ones.
    pub fn display_as_table(&self, limit: Option<usize>) -> String {
        let mut table = ui::new_styled_table();

        let mut header = vec![ui::header_cell("Country Code"), ui::header_cell("Year")];
        header.extend(self.metrics().iter().map(|m| ui::header_cell(m)));
        table.set_header(header);

        let shown = limit.unwrap_or(self.len()).min(self.len());
        for row in &self.rows()[..shown] {
            let mut cells = vec![
                Cell::new(&row.entity_code),
                Cell::new(row.year).set_alignment(CellAlignment::Right),
            ];
            cells.extend(
                row.values
                    .iter()
                    .map(|v| ui::format_optional_cell(*v, |v| ui::format_thousands(v, 0))),
            );
            table.add_row(cells);
        }

        let hidden = self.len() - shown;
        if hidden == 0 {
            return table.to_string();
        }
        format!(
            "{table}\n{}",
            ui::style_text(&format!("... {hidden} more rows"), ui::StyleType::Subtle)
        )
    }
}

/// Renders line series as a year by entity grid; years without an
/// observation show "N/A".
pub fn display_line_series(series: &[LineSeries], label: &dyn Fn(&str) -> String) -> String {
    let mut table = ui::new_styled_table();

    let mut header = vec![ui::header_cell("Year")];
    header.extend(series.iter().map(|s| ui::header_cell(&label(&s.entity_code))));
    table.set_header(header);

    let years: BTreeSet<i32> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|(year, _)| *year))
        .collect();

    for year in years {
        let mut cells = vec![Cell::new(year)];
        cells.extend(series.iter().map(|s| {
            let value = s.points.iter().find(|(y, _)| *y == year).map(|(_, v)| *v);
            ui::format_optional_cell(value, |v| ui::format_thousands(v, 0))
        }));
        table.add_row(cells);
    }

    table.to_string()
}

pub fn display_scatter(points: &[ScatterPoint], x_label: &str, y_label: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Country Code"),
        ui::header_cell("Year"),
        ui::header_cell(x_label),
        ui::header_cell(y_label),
    ]);

    for point in points {
        table.add_row(vec![
            Cell::new(&point.entity_code),
            Cell::new(point.year),
            Cell::new(ui::format_thousands(point.x, 0)).set_alignment(CellAlignment::Right),
            Cell::new(ui::format_thousands(point.y, 0)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}
