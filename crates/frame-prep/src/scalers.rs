//! Feature scaling.
//!
//! Both scalers compute their statistics over present values only and keep
//! missing cells missing. Scaled columns are always Float64.

use crate::error::{PrepError, Result};
use crate::table::Table;
use crate::utils::{is_degenerate, mean, numeric_cells, population_std, present_values};
use polars::prelude::*;
use tracing::debug;

/// Statistics of one standardized column.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Standardization {
    mean: f64,
    std_dev: f64,
}

/// Standardize each listed column: `(x - mean) / std` with population
/// statistics.
pub fn standard_scale(table: &Table, columns: &[String]) -> Result<Table> {
    let columns = table.resolve_columns("standard_scale", columns)?;

    // Validate everything before building the output
    let mut plans = Vec::with_capacity(columns.len());
    for name in &columns {
        let cells = numeric_cells(table.numeric_series(name)?)?;
        let values = present_values(&cells);
        let mean = mean(&values).ok_or_else(|| PrepError::NoValidValues(name.clone()))?;
        let std_dev = population_std(&values, mean).unwrap_or(0.0);
        if is_degenerate(&values) || !std_dev.is_finite() {
            return Err(PrepError::degenerate(name, "standard deviation is zero"));
        }
        plans.push((name, cells, Standardization { mean, std_dev }));
    }

    let mut df = table.dataframe().clone();
    for (name, cells, stats) in plans {
        debug!(
            "Standardized '{}' (mean={:.4}, std={:.4})",
            name, stats.mean, stats.std_dev
        );
        let scaled: Vec<Option<f64>> = cells
            .into_iter()
            .map(|cell| cell.map(|x| (x - stats.mean) / stats.std_dev))
            .collect();
        df.replace(name, Series::new(name.as_str().into(), scaled))?;
    }

    Ok(Table::new(df))
}

/// Rescale each listed column linearly so `[min, max]` maps onto `range`.
pub fn min_max_scale(table: &Table, columns: &[String], range: (f64, f64)) -> Result<Table> {
    let (lo, hi) = range;
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(PrepError::InvalidParameter(format!(
            "min-max range ({}, {}) must be finite with lower bound below upper bound",
            lo, hi
        )));
    }
    let columns = table.resolve_columns("min_max_scale", columns)?;

    let mut plans = Vec::with_capacity(columns.len());
    for name in &columns {
        let cells = numeric_cells(table.numeric_series(name)?)?;
        let values = present_values(&cells);
        if values.is_empty() {
            return Err(PrepError::NoValidValues(name.clone()));
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if is_degenerate(&values) {
            return Err(PrepError::degenerate(name, "range is zero"));
        }
        plans.push((name, cells, min, max));
    }

    let mut df = table.dataframe().clone();
    for (name, cells, min, max) in plans {
        debug!(
            "Min-max scaled '{}' from [{}, {}] to [{}, {}]",
            name, min, max, lo, hi
        );
        let span = max - min;
        let scaled: Vec<Option<f64>> = cells
            .into_iter()
            .map(|cell| cell.map(|x| lo + (x - min) / span * (hi - lo)))
            .collect();
        df.replace(name, Series::new(name.as_str().into(), scaled))?;
    }

    Ok(Table::new(df))
}
