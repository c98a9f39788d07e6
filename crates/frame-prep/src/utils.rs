//! Shared utilities for table operations.
//!
//! This module contains the dtype classification used to decide which
//! operations a column accepts, and the numeric statistics shared by the
//! imputers, scalers and outlier detectors.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Kind of a column for preparation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point numbers
    Numeric,
    /// Boolean type (including one-hot indicator columns)
    Boolean,
    /// String or categorical text
    Categorical,
    /// Date, datetime, duration or time
    Temporal,
    /// Anything else (nested types, binary, null)
    Other,
}

impl ColumnKind {
    /// Get the kind of a polars data type.
    pub fn of(dtype: &DataType) -> Self {
        if is_numeric_dtype(dtype) {
            Self::Numeric
        } else if matches!(dtype, DataType::Boolean) {
            Self::Boolean
        } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
            Self::Categorical
        } else if is_temporal_dtype(dtype) {
            Self::Temporal
        } else {
            Self::Other
        }
    }

    pub fn is_numeric(self) -> bool {
        self == Self::Numeric
    }
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a floating point type.
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is a temporal type.
#[inline]
pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time | DataType::Duration(_)
    )
}

// =============================================================================
// Numeric Extraction
// =============================================================================

/// Read a numeric Series as `f64` cells. Nulls and NaN both come back as `None`.
pub fn numeric_cells(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Per-row missing flags: null, or NaN in a float column.
pub fn missing_mask(series: &Series) -> Vec<bool> {
    if let Ok(ca) = series.f64() {
        return ca.into_iter().map(|v| v.is_none_or(f64::is_nan)).collect();
    }
    if let Ok(ca) = series.f32() {
        return ca.into_iter().map(|v| v.is_none_or(f32::is_nan)).collect();
    }
    series
        .is_null()
        .into_iter()
        .map(|v| v.unwrap_or(false))
        .collect()
}

/// Collect the present values of a cell vector.
pub fn present_values(cells: &[Option<f64>]) -> Vec<f64> {
    cells.iter().flatten().copied().collect()
}

// =============================================================================
// Statistics
// =============================================================================

// Computed over `present_values` rather than `Series::mean()`/`median()`,
// which would count NaN as a value.

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0) around a known mean.
pub fn population_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// True when the values have no spread: empty, or all equal.
///
/// Decided on the values themselves, since an accumulated standard deviation
/// of identical values need not come out as exactly zero.
pub fn is_degenerate(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}

/// Median of the values, averaging the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, 50.0)
}

/// Percentile of already sorted values using linear interpolation between
/// the two closest ranks (`rank = p/100 * (n - 1)`).
pub fn percentile_sorted(sorted: &[f64], percentile: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (percentile / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Most frequent value. Ties go to the smallest value under `cmp`.
pub fn sorted_mode<T, F>(mut values: Vec<T>, cmp: F) -> Option<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    values.sort_by(&cmp);

    let mut best: Option<(usize, usize)> = None; // (start index, run length)
    let mut start = 0;
    while start < values.len() {
        let mut end = start + 1;
        while end < values.len() && cmp(&values[start], &values[end]) == Ordering::Equal {
            end += 1;
        }
        let run = end - start;
        if best.is_none_or(|(_, best_run)| run > best_run) {
            best = Some((start, run));
        }
        start = end;
    }

    best.map(|(index, _)| values.swap_remove(index))
}

/// Deduplicate names while keeping the first occurrence order.
pub fn unique_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
