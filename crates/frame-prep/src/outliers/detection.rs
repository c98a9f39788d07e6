//! Outlier detectors.
//!
//! This module defines the [`OutlierDetector`] trait and its two
//! implementations:
//!
//! - [`IqrDetector`]: flags values outside `[Q1 - k*IQR, Q3 + k*IQR]`
//! - [`ZScoreDetector`]: flags values with `|x - mean| / std > t`
//!
//! Detection is read-only. The returned [`OutlierIndexSet`] is bound to the
//! exact table snapshot it was computed from.

use crate::config::{DEFAULT_IQR_MULTIPLIER, DEFAULT_ZSCORE_THRESHOLD};
use crate::error::{PrepError, Result};
use crate::table::Table;
use crate::utils::{
    is_degenerate, mean, numeric_cells, percentile_sorted, population_std, present_values,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Detection method used to build an index set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Iqr,
    Zscore,
    /// Positions supplied by the caller.
    Manual,
}

/// Statistics the detector computed, kept for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DetectionStats {
    Iqr {
        q1: f64,
        q3: f64,
        iqr: f64,
        lower: f64,
        upper: f64,
    },
    Zscore {
        mean: f64,
        std_dev: f64,
        threshold: f64,
    },
    Manual,
}

/// Ascending, duplicate-free row positions flagged in one column of one
/// table snapshot.
///
/// Deserialized sets are checked for strictly ascending positions; range is
/// checked against the table when the set is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexSetFields")]
pub struct OutlierIndexSet {
    column: String,
    generation: u64,
    positions: Vec<usize>,
    stats: DetectionStats,
}

#[derive(Deserialize)]
struct IndexSetFields {
    column: String,
    generation: u64,
    positions: Vec<usize>,
    stats: DetectionStats,
}

impl TryFrom<IndexSetFields> for OutlierIndexSet {
    type Error = PrepError;

    fn try_from(fields: IndexSetFields) -> Result<Self> {
        if let Some(pair) = fields.positions.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PrepError::InvalidParameter(format!(
                "index set positions for '{}' must be strictly ascending, found {} before {}",
                fields.column, pair[0], pair[1]
            )));
        }
        Ok(Self {
            column: fields.column,
            generation: fields.generation,
            positions: fields.positions,
            stats: fields.stats,
        })
    }
}

impl OutlierIndexSet {
    /// Build an index set by hand against `table`.
    ///
    /// Positions are sorted and deduplicated. Fails with `UnknownColumn` or
    /// with `InvalidParameter` for a position outside the table.
    pub fn from_positions(table: &Table, column: &str, positions: &[usize]) -> Result<Self> {
        table.series(column)?;
        if let Some(bad) = positions.iter().find(|p| **p >= table.height()) {
            return Err(PrepError::InvalidParameter(format!(
                "row position {} is out of range for a table with {} rows",
                bad,
                table.height()
            )));
        }

        let mut positions = positions.to_vec();
        positions.sort_unstable();
        positions.dedup();

        Ok(Self {
            column: column.to_string(),
            generation: table.generation(),
            positions,
            stats: DetectionStats::Manual,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Generation of the table the set was computed from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn stats(&self) -> &DetectionStats {
        &self.stats
    }

    pub fn method(&self) -> DetectionMethod {
        match self.stats {
            DetectionStats::Iqr { .. } => DetectionMethod::Iqr,
            DetectionStats::Zscore { .. } => DetectionMethod::Zscore,
            DetectionStats::Manual => DetectionMethod::Manual,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, position: usize) -> bool {
        self.positions.binary_search(&position).is_ok()
    }
}

/// A single-column outlier detection strategy.
///
/// Implementations must be `Send + Sync` so they can be shared with a
/// pipeline state held behind a lock.
pub trait OutlierDetector: Send + Sync {
    /// Flag outlying rows of `column` in `table`.
    ///
    /// Missing cells are never flagged. Fails with `UnknownColumn`,
    /// `NonNumericColumn` or `NoValidValues`.
    fn detect(&self, table: &Table, column: &str) -> Result<OutlierIndexSet>;

    /// Short method name for logging.
    fn name(&self) -> &'static str;
}

/// Interquartile range fences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrDetector {
    pub multiplier: f64,
}

impl IqrDetector {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }
}

impl Default for IqrDetector {
    fn default() -> Self {
        Self::new(DEFAULT_IQR_MULTIPLIER)
    }
}

impl OutlierDetector for IqrDetector {
    fn detect(&self, table: &Table, column: &str) -> Result<OutlierIndexSet> {
        let cells = numeric_cells(table.numeric_series(column)?)?;
        let mut sorted = present_values(&cells);
        sorted.sort_by(f64::total_cmp);

        let (Some(q1), Some(q3)) = (
            percentile_sorted(&sorted, 25.0),
            percentile_sorted(&sorted, 75.0),
        ) else {
            return Err(PrepError::NoValidValues(column.to_string()));
        };
        let iqr = q3 - q1;
        let lower = q1 - self.multiplier * iqr;
        let upper = q3 + self.multiplier * iqr;

        let positions = flagged_positions(&cells, |x| x < lower || x > upper);
        debug!(
            "IQR on '{}': q1={}, q3={}, bounds=[{}, {}], {} outliers",
            column,
            q1,
            q3,
            lower,
            upper,
            positions.len()
        );

        Ok(OutlierIndexSet {
            column: column.to_string(),
            generation: table.generation(),
            positions,
            stats: DetectionStats::Iqr {
                q1,
                q3,
                iqr,
                lower,
                upper,
            },
        })
    }

    fn name(&self) -> &'static str {
        "iqr"
    }
}

/// Standard score threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreDetector {
    pub threshold: f64,
}

impl ZScoreDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ZSCORE_THRESHOLD)
    }
}

impl OutlierDetector for ZScoreDetector {
    fn detect(&self, table: &Table, column: &str) -> Result<OutlierIndexSet> {
        let cells = numeric_cells(table.numeric_series(column)?)?;
        let values = present_values(&cells);
        let mean = mean(&values).ok_or_else(|| PrepError::NoValidValues(column.to_string()))?;
        let std_dev = population_std(&values, mean).unwrap_or(0.0);
        if is_degenerate(&values) || !std_dev.is_finite() {
            return Err(PrepError::degenerate(column, "standard deviation is zero"));
        }

        let threshold = self.threshold;
        let positions = flagged_positions(&cells, |x| ((x - mean) / std_dev).abs() > threshold);
        debug!(
            "Z-score on '{}': mean={:.4}, std={:.4}, threshold={}, {} outliers",
            column,
            mean,
            std_dev,
            threshold,
            positions.len()
        );

        Ok(OutlierIndexSet {
            column: column.to_string(),
            generation: table.generation(),
            positions,
            stats: DetectionStats::Zscore {
                mean,
                std_dev,
                threshold,
            },
        })
    }

    fn name(&self) -> &'static str {
        "zscore"
    }
}

fn flagged_positions(cells: &[Option<f64>], is_outlier: impl Fn(f64) -> bool) -> Vec<usize> {
    cells
        .iter()
        .enumerate()
        .filter_map(|(position, cell)| cell.filter(|x| is_outlier(*x)).map(|_| position))
        .collect()
}

/// IQR detection with the default multiplier of 1.5.
pub fn detect_outliers_iqr(table: &Table, column: &str) -> Result<OutlierIndexSet> {
    IqrDetector::default().detect(table, column)
}

/// Z-score detection with the default threshold of 3.0.
pub fn detect_outliers_zscore(table: &Table, column: &str) -> Result<OutlierIndexSet> {
    ZScoreDetector::default().detect(table, column)
}
