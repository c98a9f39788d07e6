//! Table loading from CSV or Parquet files.

use crate::error::{PrepError, Result, ResultExt};
use crate::table::Table;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows scanned to infer CSV column types.
const INFER_SCHEMA_ROWS: usize = 100;

/// Load a table, choosing the reader from the file extension.
///
/// `.parquet` files are read as Parquet; everything else as CSV with a
/// header row.
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

    let df = if is_parquet {
        read_parquet(path)?
    } else {
        read_csv(path)?
    };

    info!(
        "Loaded {}: {} rows x {} columns",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(Table::new(df))
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PrepError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    debug!("Reading CSV {}", path.display());

    CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .and_then(|reader| reader.finish())
        .context(format!("Failed to read CSV {}", path.display()))
}

fn read_parquet(path: &Path) -> Result<DataFrame> {
    debug!("Reading Parquet {}", path.display());
    let file = File::open(path)?;
    ParquetReader::new(file)
        .finish()
        .context(format!("Failed to read Parquet {}", path.display()))
}

/// Read a table from in-memory CSV bytes.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<Table> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .into_reader_with_file_handle(cursor)
        .finish()
        .context("Failed to parse CSV data")?;
    Ok(Table::new(df))
}
