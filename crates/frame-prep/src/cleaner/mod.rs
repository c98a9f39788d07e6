//! Structural cleaning operations.
//!
//! This module provides:
//! - Removing selected columns
//! - Removing rows with missing values in selected columns

use crate::error::Result;
use crate::table::Table;
use crate::utils::{missing_mask, unique_names};
use polars::prelude::*;
use tracing::debug;

/// Remove the listed columns. Remaining columns keep their order.
pub fn remove_columns(table: &Table, columns: &[String]) -> Result<Table> {
    let columns = table.resolve_columns("remove_columns", columns)?;

    let names: Vec<PlSmallStr> = columns.iter().map(|s| s.as_str().into()).collect();
    let df = table.dataframe().drop_many(names);

    debug!("Removed {} columns: {:?}", columns.len(), columns);
    Ok(Table::new(df))
}

/// Remove every row where any of the listed columns is missing.
///
/// An empty selection is a no-op and returns the same snapshot.
pub fn drop_rows_with_missing(table: &Table, columns: &[String]) -> Result<Table> {
    if columns.is_empty() {
        debug!("No columns selected, keeping all rows");
        return Ok(table.clone());
    }
    table.ensure_columns(columns)?;

    let mut keep = vec![true; table.height()];
    for name in unique_names(columns) {
        let series = table.series(&name)?;
        for (flag, missing) in keep.iter_mut().zip(missing_mask(series)) {
            if missing {
                *flag = false;
            }
        }
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let df = table.dataframe().filter(&mask)?;

    debug!(
        "Removed {} rows with missing values in {:?}",
        table.height() - df.height(),
        columns
    );
    Ok(Table::new(df))
}
