//! Categorical encoders.
//!
//! - One-hot encoding: one boolean indicator column per observed category
//! - Label encoding: integer codes by ascending order of distinct values

use crate::error::{PrepError, Result};
use crate::table::Table;
use crate::utils::{ColumnKind, is_float_dtype, missing_mask, numeric_cells};
use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Replace each listed column with one indicator column per distinct
/// observed value.
///
/// Indicators are named `<column>_<category>`, appear in first-seen order of
/// the categories and take the position of the encoded column. Missing cells
/// are `false` in every indicator. Every category gets its own column.
pub fn one_hot_encode(table: &Table, columns: &[String]) -> Result<Table> {
    let selected = table.resolve_columns("one_hot_encode", columns)?;

    let mut output: Vec<Column> = Vec::with_capacity(table.width());
    for column in table.dataframe().get_columns() {
        let name = column.name().as_str();
        if selected.iter().any(|s| s == name) {
            let indicators = indicator_columns(column.as_materialized_series(), name)?;
            debug!("One-hot encoded '{}' into {} columns", name, indicators.len());
            output.extend(indicators);
        } else {
            output.push(column.clone());
        }
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = output.iter().find(|c| !seen.insert(c.name().as_str())) {
        return Err(PrepError::DuplicateColumn(duplicate.name().to_string()));
    }

    Ok(Table::new(DataFrame::new(output)?))
}

fn indicator_columns(series: &Series, name: &str) -> Result<Vec<Column>> {
    let missing = missing_mask(series);
    let text = series.cast(&DataType::String)?;
    let cells: Vec<Option<&str>> = text
        .str()?
        .into_iter()
        .zip(missing)
        .map(|(value, is_missing)| if is_missing { None } else { value })
        .collect();

    let mut seen = HashSet::new();
    let categories: Vec<&str> = cells
        .iter()
        .flatten()
        .copied()
        .filter(|category| seen.insert(*category))
        .collect();

    Ok(categories
        .into_iter()
        .map(|category| {
            let flags: Vec<bool> = cells.iter().map(|cell| *cell == Some(category)).collect();
            Series::new(format!("{}_{}", name, category).into(), flags).into_column()
        })
        .collect())
}

/// Replace each listed column's values with 0-based integer codes assigned
/// by ascending sort order of its distinct present values.
///
/// Codes are independent per column and missing cells stay missing. Numeric
/// columns are accepted too, so encoding an already encoded column is
/// allowed; it only reproduces the same codes while they are still dense
/// (0..k with none missing).
pub fn label_encode(table: &Table, columns: &[String]) -> Result<Table> {
    let selected = table.resolve_columns("label_encode", columns)?;

    let mut df = table.dataframe().clone();
    for name in &selected {
        let series = table.series(name)?;
        let (codes, classes) = encode_series(series, name)?;
        debug!("Label encoded '{}' with {} classes", name, classes);
        df.replace(name, Series::new(name.as_str().into(), codes))?;
    }

    Ok(Table::new(df))
}

fn encode_series(series: &Series, name: &str) -> Result<(Vec<Option<i64>>, usize)> {
    match ColumnKind::of(series.dtype()) {
        ColumnKind::Numeric | ColumnKind::Temporal => {
            // Integers and temporal values are compared exactly, not through f64
            let physical = series.to_physical_repr().into_owned();
            if is_float_dtype(physical.dtype()) {
                Ok(codes_for(&numeric_cells(&physical)?, f64::total_cmp))
            } else if matches!(physical.dtype(), DataType::UInt64) {
                let cells: Vec<Option<u64>> = physical.u64()?.into_iter().collect();
                Ok(codes_for(&cells, |a, b| a.cmp(b)))
            } else {
                let integers = physical.cast(&DataType::Int64)?;
                let cells: Vec<Option<i64>> = integers.i64()?.into_iter().collect();
                Ok(codes_for(&cells, |a, b| a.cmp(b)))
            }
        }
        ColumnKind::Boolean => {
            let cells: Vec<Option<bool>> = series.bool()?.into_iter().collect();
            Ok(codes_for(&cells, |a, b| a.cmp(b)))
        }
        ColumnKind::Categorical => {
            let text = series.cast(&DataType::String)?;
            let cells: Vec<Option<&str>> = text.str()?.into_iter().collect();
            Ok(codes_for(&cells, |a, b| a.cmp(b)))
        }
        ColumnKind::Other => Err(PrepError::InvalidParameter(format!(
            "label encoding is not supported for column '{}' of type {}",
            name,
            series.dtype()
        ))),
    }
}

/// Map each present cell to the rank of its value among the distinct values.
fn codes_for<T, F>(cells: &[Option<T>], cmp: F) -> (Vec<Option<i64>>, usize)
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    let mut classes: Vec<T> = cells.iter().flatten().cloned().collect();
    classes.sort_by(&cmp);
    classes.dedup_by(|a, b| cmp(&*a, &*b) == Ordering::Equal);

    let codes = cells
        .iter()
        .map(|cell| {
            cell.as_ref().and_then(|value| {
                classes
                    .binary_search_by(|probe| cmp(probe, value))
                    .ok()
                    .map(|index| index as i64)
            })
        })
        .collect();

    (codes, classes.len())
}
