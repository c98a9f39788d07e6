//! CSV export.
//!
//! Output is UTF-8, comma separated, with a header row and no index column.
//! Missing values become empty fields. The same table always serializes to
//! the same bytes.

use crate::error::{Result, ResultExt};
use crate::table::Table;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Serialize a table to CSV bytes.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut df = table.dataframe().clone();
    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)
        .context("Failed to serialize table as CSV")?;
    Ok(buffer)
}

/// Write a table to a CSV file, replacing any existing file.
pub fn write_csv(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut df = table.dataframe().clone();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)
        .context(format!("Failed to write {}", path.display()))?;

    info!(
        "Exported {} rows x {} columns to {}",
        table.height(),
        table.width(),
        path.display()
    );
    Ok(())
}
