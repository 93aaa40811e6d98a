use crate::core::MergedTable;
use crate::core::query::write_csv;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Writes `table` as CSV to `output`, or to stdout when no path is given.
pub fn run(table: &MergedTable, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create export file: {}", path.display()))?;
            write_csv(table, BufWriter::new(file))?;
            tracing::info!(rows = table.len(), "Exported data to {}", path.display());
        }
        None => write_csv(table, std::io::stdout().lock())?,
    }
    Ok(())
}
