//! Statistical imputation methods.
//!
//! Provides mean, median and mode imputation. Statistics are computed over
//! present values only and only missing cells are overwritten.

use crate::error::{PrepError, Result};
use crate::table::Table;
use crate::utils::{
    ColumnKind, is_float_dtype, mean, median, missing_mask, numeric_cells, present_values,
    sorted_mode,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Statistic used to fill missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeMethod {
    /// Mean of present values (numeric columns only)
    Mean,
    /// Median of present values (numeric columns only)
    Median,
    /// Most frequent present value; ties go to the smallest value
    Mode,
}

impl ImputeMethod {
    pub fn requires_numeric(self) -> bool {
        matches!(self, Self::Mean | Self::Median)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
        }
    }
}

/// Statistical imputation for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill missing values in each listed column with the chosen statistic.
    ///
    /// All columns are validated before any work. Columns without missing
    /// values are left untouched, dtype included. Mean and median produce a
    /// Float64 column; mode keeps the column dtype (categorical text comes
    /// back as String).
    pub fn impute(table: &Table, columns: &[String], method: ImputeMethod) -> Result<Table> {
        let columns = table.resolve_columns("impute", columns)?;
        if method.requires_numeric() {
            for name in &columns {
                table.numeric_series(name)?;
            }
        }

        let mut df = table.dataframe().clone();
        for name in &columns {
            let series = table.series(name)?;
            if !missing_mask(series).contains(&true) {
                debug!("Column '{}' has no missing values, skipping", name);
                continue;
            }

            let filled = match method {
                ImputeMethod::Mean => Self::fill_numeric(series, name, method, mean)?,
                ImputeMethod::Median => Self::fill_numeric(series, name, method, median)?,
                ImputeMethod::Mode => Self::fill_mode(series, name)?,
            };
            df.replace(name, filled)?;
        }

        Ok(Table::new(df))
    }

    /// Fill a numeric column with a statistic of its present values.
    fn fill_numeric(
        series: &Series,
        name: &str,
        method: ImputeMethod,
        statistic: fn(&[f64]) -> Option<f64>,
    ) -> Result<Series> {
        let cells = numeric_cells(series)?;
        let fill_value = statistic(&present_values(&cells))
            .ok_or_else(|| PrepError::NoValidValues(name.to_string()))?;

        debug!("Filled '{}' with {}: {:.2}", name, method.as_str(), fill_value);
        let filled: Vec<Option<f64>> = cells
            .into_iter()
            .map(|cell| Some(cell.unwrap_or(fill_value)))
            .collect();
        Ok(Series::new(series.name().clone(), filled))
    }

    /// Fill a column of any supported kind with its mode.
    fn fill_mode(series: &Series, name: &str) -> Result<Series> {
        match ColumnKind::of(series.dtype()) {
            ColumnKind::Numeric | ColumnKind::Temporal => {
                // Work on the physical representation and restore the logical type
                let physical = series.to_physical_repr().into_owned();
                let filled = if is_float_dtype(physical.dtype()) {
                    Self::fill_float_mode(&physical, name)?
                } else if matches!(physical.dtype(), DataType::UInt64) {
                    let cells = physical.u64()?.into_iter().collect();
                    Self::fill_with_mode(&physical, name, cells)?
                } else {
                    let integers = physical.cast(&DataType::Int64)?;
                    let cells = integers.i64()?.into_iter().collect();
                    Self::fill_with_mode(&physical, name, cells)?
                };
                Ok(filled.cast(series.dtype())?)
            }
            ColumnKind::Boolean => {
                let cells = series.bool()?.into_iter().collect();
                Self::fill_with_mode(series, name, cells)
            }
            ColumnKind::Categorical => {
                let text = series.cast(&DataType::String)?;
                let cells = text.str()?.into_iter().collect();
                Self::fill_with_mode(series, name, cells)
            }
            ColumnKind::Other => Err(PrepError::InvalidParameter(format!(
                "mode imputation is not supported for column '{}' of type {}",
                name,
                series.dtype()
            ))),
        }
    }

    /// Mode fill for exactly comparable cells. Present cells are kept as is.
    fn fill_with_mode<T>(series: &Series, name: &str, cells: Vec<Option<T>>) -> Result<Series>
    where
        T: Ord + Copy + std::fmt::Display,
        Series: NamedFrom<Vec<Option<T>>, [Option<T>]>,
    {
        let present: Vec<T> = cells.iter().flatten().copied().collect();
        let mode = sorted_mode(present, T::cmp)
            .ok_or_else(|| PrepError::NoValidValues(name.to_string()))?;

        debug!("Filled '{}' with mode: {}", name, mode);
        let filled: Vec<Option<T>> = cells.into_iter().map(|c| Some(c.unwrap_or(mode))).collect();
        Ok(Series::new(series.name().clone(), filled))
    }

    /// Mode fill for floating point data, where NaN counts as missing.
    fn fill_float_mode(series: &Series, name: &str) -> Result<Series> {
        let cells = numeric_cells(series)?;
        let mode = sorted_mode(present_values(&cells), f64::total_cmp)
            .ok_or_else(|| PrepError::NoValidValues(name.to_string()))?;

        debug!("Filled '{}' with mode: {}", name, mode);
        let filled: Vec<Option<f64>> = cells.into_iter().map(|c| Some(c.unwrap_or(mode))).collect();
        Ok(Series::new(series.name().clone(), filled).cast(series.dtype())?)
    }
}
