//! In-memory column store.
//!
//! A [`Table`] wraps a polars [`DataFrame`] (ordered, uniquely named,
//! equal-length columns with null as the missing marker) and tags it with a
//! generation id. Outlier index sets remember the generation they were
//! computed against, which lets treatments reject positions computed on a
//! different snapshot.

use crate::error::{PrepError, Result};
use crate::utils::{ColumnKind, missing_mask, unique_names};
use polars::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// An immutable table snapshot.
///
/// Cloning a `Table` yields the same snapshot (same generation). Operations
/// never mutate a table; they build a new one with a fresh generation.
#[derive(Debug, Clone)]
pub struct Table {
    df: DataFrame,
    generation: u64,
}

impl Table {
    /// Wrap a DataFrame as a new snapshot.
    pub fn new(df: DataFrame) -> Self {
        Self {
            df,
            generation: next_generation(),
        }
    }

    /// Build a table from columns. Fails on duplicate names or unequal lengths.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        Ok(Self::new(DataFrame::new(columns)?))
    }

    /// Same content under a fresh generation.
    ///
    /// Index sets computed against `self` are not accepted by the snapshot.
    pub fn snapshot(&self) -> Self {
        Self::new(self.df.clone())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_dataframe(self) -> DataFrame {
        self.df
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }

    /// Get a column as a Series.
    pub fn series(&self, name: &str) -> Result<&Series> {
        if !self.has_column(name) {
            return Err(PrepError::UnknownColumn(name.to_string()));
        }
        Ok(self.df.column(name)?.as_materialized_series())
    }

    /// Get the kind of a column.
    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        Ok(ColumnKind::of(self.series(name)?.dtype()))
    }

    /// Get a column, failing with `NonNumericColumn` unless it is numeric.
    pub fn numeric_series(&self, name: &str) -> Result<&Series> {
        let series = self.series(name)?;
        if !ColumnKind::of(series.dtype()).is_numeric() {
            return Err(PrepError::non_numeric(name, series.dtype()));
        }
        Ok(series)
    }

    /// Names of columns with a numeric dtype.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns_of_kind(ColumnKind::Numeric)
    }

    /// Names of text/categorical columns (candidates for encoding).
    pub fn categorical_columns(&self) -> Vec<String> {
        self.columns_of_kind(ColumnKind::Categorical)
    }

    fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|col| ColumnKind::of(col.dtype()) == kind)
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Missing-value count (null or NaN) for every column, in table order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.df
            .get_columns()
            .iter()
            .map(|col| {
                let missing = missing_mask(col.as_materialized_series())
                    .into_iter()
                    .filter(|m| *m)
                    .count();
                (col.name().to_string(), missing)
            })
            .collect()
    }

    /// Names of columns that contain at least one missing value.
    pub fn columns_with_missing(&self) -> Vec<String> {
        self.missing_counts()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, _)| name)
            .collect()
    }

    /// Validate a column selection for an operation.
    ///
    /// Returns the names deduplicated in first-seen order. Fails with
    /// `EmptySelection` for an empty list and `UnknownColumn` for the first
    /// absent name.
    pub fn resolve_columns(&self, operation: &'static str, names: &[String]) -> Result<Vec<String>> {
        if names.is_empty() {
            return Err(PrepError::EmptySelection(operation));
        }
        self.ensure_columns(names)?;
        Ok(unique_names(names))
    }

    /// Fail with `UnknownColumn` for the first name not in the table.
    pub fn ensure_columns(&self, names: &[String]) -> Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(PrepError::UnknownColumn(missing.clone())),
            None => Ok(()),
        }
    }
}

impl From<DataFrame> for Table {
    fn from(df: DataFrame) -> Self {
        Self::new(df)
    }
}

/// Tables compare by content; the generation is ignored.
impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.df.equals_missing(&other.df)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            df![
                "age" => [Some(22i64), None, Some(35)],
                "city" => [Some("Oslo"), Some("Rome"), None],
                "active" => [true, false, true],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_generations_are_unique() {
        let a = sample();
        let b = sample();
        assert_ne!(a.generation(), b.generation());
    }

    #[test]
    fn test_clone_keeps_generation_snapshot_does_not() {
        let table = sample();
        assert_eq!(table.clone().generation(), table.generation());

        let snapshot = table.snapshot();
        assert_ne!(snapshot.generation(), table.generation());
        assert_eq!(snapshot, table);
    }

    #[test]
    fn test_from_columns_rejects_duplicate_names() {
        let a = Series::new("x".into(), &[1i64, 2]).into_column();
        let b = Series::new("x".into(), &[3i64, 4]).into_column();
        assert!(Table::from_columns(vec![a, b]).is_err());
    }

    #[test]
    fn test_from_columns_rejects_unequal_lengths() {
        let a = Series::new("x".into(), &[1i64, 2]).into_column();
        let b = Series::new("y".into(), &[3i64]).into_column();
        assert!(Table::from_columns(vec![a, b]).is_err());
    }

    #[test]
    fn test_series_unknown_column() {
        let err = sample().series("salary").unwrap_err();
        assert!(matches!(err, PrepError::UnknownColumn(name) if name == "salary"));
    }

    #[test]
    fn test_numeric_series_rejects_text() {
        let table = sample();
        assert!(table.numeric_series("age").is_ok());
        assert!(matches!(
            table.numeric_series("city").unwrap_err(),
            PrepError::NonNumericColumn { .. }
        ));
        assert!(matches!(
            table.numeric_series("active").unwrap_err(),
            PrepError::NonNumericColumn { .. }
        ));
    }

    #[test]
    fn test_column_helpers() {
        let table = sample();
        assert_eq!(table.numeric_columns(), vec!["age".to_string()]);
        assert_eq!(table.categorical_columns(), vec!["city".to_string()]);
        assert_eq!(
            table.columns_with_missing(),
            vec!["age".to_string(), "city".to_string()]
        );
        assert_eq!(table.missing_counts()[2], ("active".to_string(), 0));
        assert_eq!(table.column_kind("active").unwrap(), ColumnKind::Boolean);
    }

    #[test]
    fn test_resolve_columns() {
        let table = sample();
        let resolved = table
            .resolve_columns("impute", &["city".to_string(), "age".to_string(), "city".to_string()])
            .unwrap();
        assert_eq!(resolved, vec!["city".to_string(), "age".to_string()]);

        assert!(matches!(
            table.resolve_columns("impute", &[]).unwrap_err(),
            PrepError::EmptySelection("impute")
        ));
        assert!(matches!(
            table.resolve_columns("impute", &["nope".to_string()]).unwrap_err(),
            PrepError::UnknownColumn(_)
        ));
    }
}
