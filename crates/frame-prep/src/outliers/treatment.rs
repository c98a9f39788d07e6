//! Outlier treatments.
//!
//! Treatments consume an [`OutlierIndexSet`] and only accept it against the
//! snapshot it was computed from.

use super::detection::OutlierIndexSet;
use crate::error::{PrepError, Result};
use crate::table::Table;
use crate::utils::{median, numeric_cells};
use polars::prelude::*;
use tracing::debug;

/// Check that `outliers` belongs to `table` and `column`.
fn validate(table: &Table, column: &str, outliers: &OutlierIndexSet) -> Result<()> {
    if outliers.generation() != table.generation() {
        return Err(PrepError::StaleIndexSet {
            column: outliers.column().to_string(),
            expected: outliers.generation(),
            actual: table.generation(),
        });
    }
    if outliers.column() != column {
        return Err(PrepError::InvalidParameter(format!(
            "index set was computed for column '{}', not '{}'",
            outliers.column(),
            column
        )));
    }
    table.series(column)?;
    if let Some(last) = outliers.positions().last()
        && *last >= table.height()
    {
        return Err(PrepError::InvalidParameter(format!(
            "row position {} is out of range for a table with {} rows",
            last,
            table.height()
        )));
    }
    Ok(())
}

/// Drop the flagged rows. Survivors keep their relative order.
///
/// An empty set returns the same snapshot.
pub fn remove_outliers(table: &Table, column: &str, outliers: &OutlierIndexSet) -> Result<Table> {
    validate(table, column, outliers)?;
    if outliers.is_empty() {
        debug!("No outliers to remove in '{}'", column);
        return Ok(table.clone());
    }

    let keep: Vec<bool> = (0..table.height()).map(|row| !outliers.contains(row)).collect();
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let df = table.dataframe().filter(&mask)?;

    debug!("Removed {} outlier rows from '{}'", outliers.len(), column);
    Ok(Table::new(df))
}

/// Overwrite the flagged cells with the median of the other present cells.
///
/// The column becomes Float64 and the row count is unchanged. An empty set
/// returns the same snapshot.
pub fn transform_outliers(
    table: &Table,
    column: &str,
    outliers: &OutlierIndexSet,
) -> Result<Table> {
    validate(table, column, outliers)?;
    if outliers.is_empty() {
        debug!("No outliers to transform in '{}'", column);
        return Ok(table.clone());
    }

    let series = table.numeric_series(column)?;
    let cells = numeric_cells(series)?;
    let inliers: Vec<f64> = cells
        .iter()
        .enumerate()
        .filter(|(row, _)| !outliers.contains(*row))
        .filter_map(|(_, cell)| *cell)
        .collect();
    let replacement = median(&inliers).ok_or_else(|| PrepError::NoValidValues(column.to_string()))?;

    // Unflagged cells are copied as they are, NaN included
    let original = series.cast(&DataType::Float64)?;
    let transformed: Vec<Option<f64>> = original
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, cell)| {
            if outliers.contains(row) {
                Some(replacement)
            } else {
                cell
            }
        })
        .collect();

    let mut df = table.dataframe().clone();
    df.replace(column, Series::new(column.into(), transformed))?;

    debug!(
        "Replaced {} outliers in '{}' with median {}",
        outliers.len(),
        column,
        replacement
    );
    Ok(Table::new(df))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outliers::detection::{detect_outliers_iqr, detect_outliers_zscore};
    use pretty_assertions::assert_eq;

    fn scenario() -> Table {
        Table::new(
            df![
                "id" => [1i64, 2, 3, 4, 5, 6],
                "x" => [1.0, 2.0, 3.0, 4.0, 5.0, 100.0],
            ]
            .unwrap(),
        )
    }

    fn floats(table: &Table, name: &str) -> Vec<Option<f64>> {
        table.series(name).unwrap().f64().unwrap().into_iter().collect()
    }

    // ==================== remove_outliers tests ====================

    #[test]
    fn test_remove_scenario() {
        let table = scenario();
        let set = detect_outliers_iqr(&table, "x").unwrap();

        let result = remove_outliers(&table, "x", &set).unwrap();

        assert_eq!(
            floats(&result, "x"),
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]
        );
        let ids: Vec<Option<i64>> = result.series("id").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn test_remove_empty_set_is_noop() {
        let table = scenario();
        let set = detect_outliers_zscore(&table, "x").unwrap();
        assert!(set.is_empty());

        let result = remove_outliers(&table, "x", &set).unwrap();

        assert_eq!(result, table);
        assert_eq!(result.generation(), table.generation());
    }

    #[test]
    fn test_remove_manual_positions_keep_order() {
        let table = scenario();
        let set = OutlierIndexSet::from_positions(&table, "x", &[0, 3]).unwrap();

        let result = remove_outliers(&table, "x", &set).unwrap();

        assert_eq!(
            floats(&result, "x"),
            vec![Some(2.0), Some(3.0), Some(5.0), Some(100.0)]
        );
    }

    // ==================== transform_outliers tests ====================

    #[test]
    fn test_transform_scenario() {
        let table = scenario();
        let set = detect_outliers_iqr(&table, "x").unwrap();

        let result = transform_outliers(&table, "x", &set).unwrap();

        assert_eq!(
            floats(&result, "x"),
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(3.0)]
        );
        assert_eq!(result.height(), table.height());
    }

    #[test]
    fn test_transform_median_excludes_flagged_and_missing() {
        let table = Table::new(df!["x" => [Some(1i64), None, Some(7), Some(9), Some(1000)]].unwrap());
        let set = OutlierIndexSet::from_positions(&table, "x", &[4]).unwrap();

        let result = transform_outliers(&table, "x", &set).unwrap();

        // median of [1, 7, 9] = 7; missing cell stays missing
        assert_eq!(
            floats(&result, "x"),
            vec![Some(1.0), None, Some(7.0), Some(9.0), Some(7.0)]
        );
    }

    #[test]
    fn test_transform_keeps_unflagged_nan() {
        let table = Table::new(df!["x" => [1.0, f64::NAN, 2.0, 3.0, 100.0]].unwrap());
        let set = OutlierIndexSet::from_positions(&table, "x", &[4]).unwrap();

        let result = transform_outliers(&table, "x", &set).unwrap();
        let values = floats(&result, "x");

        // median of [1, 2, 3] = 2; the NaN cell is neither flagged nor nulled
        assert_eq!(values[0], Some(1.0));
        assert!(values[1].is_some_and(f64::is_nan));
        assert_eq!(&values[2..], &[Some(2.0), Some(3.0), Some(2.0)]);
    }

    #[test]
    fn test_transform_every_row_flagged() {
        let table = Table::new(df!["x" => [1.0, 2.0]].unwrap());
        let set = OutlierIndexSet::from_positions(&table, "x", &[0, 1]).unwrap();

        let err = transform_outliers(&table, "x", &set).unwrap_err();
        assert!(matches!(err, PrepError::NoValidValues(_)));
    }

    // ==================== validation tests ====================

    #[test]
    fn test_stale_index_set_rejected() {
        let table = scenario();
        let set = detect_outliers_iqr(&table, "x").unwrap();
        let newer = table.snapshot();

        let err = remove_outliers(&newer, "x", &set).unwrap_err();
        assert!(matches!(
            err,
            PrepError::StaleIndexSet { expected, actual, .. }
                if expected == table.generation() && actual == newer.generation()
        ));

        let err = transform_outliers(&newer, "x", &set).unwrap_err();
        assert_eq!(err.error_code(), "STALE_INDEX_SET");
    }

    #[test]
    fn test_deserialized_out_of_range_set_rejected() {
        let table = scenario();
        let set = OutlierIndexSet::from_positions(&table, "x", &[1]).unwrap();
        let mut json = serde_json::to_value(&set).unwrap();
        json["positions"] = serde_json::json!([1, 7]);
        let set: OutlierIndexSet = serde_json::from_value(json).unwrap();

        let err = remove_outliers(&table, "x", &set).unwrap_err();
        assert!(matches!(err, PrepError::InvalidParameter(message) if message.contains("7")));

        let err = transform_outliers(&table, "x", &set).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_column_mismatch_rejected() {
        let table = scenario();
        let set = detect_outliers_iqr(&table, "x").unwrap();

        let err = remove_outliers(&table, "id", &set).unwrap_err();
        assert!(matches!(err, PrepError::InvalidParameter(_)));
    }
}
