//! Operations the pipeline state can apply.

use crate::cleaner::{drop_rows_with_missing, remove_columns};
use crate::config::PipelineConfig;
use crate::encoders::{label_encode, one_hot_encode};
use crate::error::Result;
use crate::imputers::{ImputeMethod, StatisticalImputer};
use crate::outliers::{
    IqrDetector, OutlierDetector, OutlierIndexSet, ZScoreDetector, remove_outliers,
    transform_outliers,
};
use crate::scalers::{min_max_scale, standard_scale};
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// One user-selected step with its parameters.
///
/// Serialized as `{"op": "<name>", ...params}`, for example
/// `{"op": "impute", "columns": ["age"], "method": "median"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    RemoveColumns {
        columns: Vec<String>,
    },
    DropMissingRows {
        #[serde(default)]
        columns: Vec<String>,
    },
    Impute {
        columns: Vec<String>,
        method: ImputeMethod,
    },
    OneHotEncode {
        columns: Vec<String>,
    },
    LabelEncode {
        columns: Vec<String>,
    },
    StandardScale {
        columns: Vec<String>,
    },
    MinMaxScale {
        columns: Vec<String>,
        /// Target range; the configured default when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<(f64, f64)>,
    },
    DetectOutliersIqr {
        column: String,
    },
    DetectOutliersZscore {
        column: String,
    },
    RemoveOutliers {
        column: String,
        outliers: OutlierIndexSet,
    },
    TransformOutliers {
        column: String,
        outliers: OutlierIndexSet,
    },
}

/// Result of applying an [`Operation`].
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    /// The new working table.
    Table(Table),
    /// Outliers found by a detection; the working table is unchanged.
    Outliers(OutlierIndexSet),
}

impl ApplyOutcome {
    pub fn table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            Self::Outliers(_) => None,
        }
    }

    pub fn outliers(&self) -> Option<&OutlierIndexSet> {
        match self {
            Self::Outliers(set) => Some(set),
            Self::Table(_) => None,
        }
    }
}

impl Operation {
    /// Wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RemoveColumns { .. } => "remove_columns",
            Self::DropMissingRows { .. } => "drop_missing_rows",
            Self::Impute { .. } => "impute",
            Self::OneHotEncode { .. } => "one_hot_encode",
            Self::LabelEncode { .. } => "label_encode",
            Self::StandardScale { .. } => "standard_scale",
            Self::MinMaxScale { .. } => "min_max_scale",
            Self::DetectOutliersIqr { .. } => "detect_outliers_iqr",
            Self::DetectOutliersZscore { .. } => "detect_outliers_zscore",
            Self::RemoveOutliers { .. } => "remove_outliers",
            Self::TransformOutliers { .. } => "transform_outliers",
        }
    }

    /// Detections only read the table.
    pub fn is_detection(&self) -> bool {
        matches!(
            self,
            Self::DetectOutliersIqr { .. } | Self::DetectOutliersZscore { .. }
        )
    }

    /// Run the operation against `table`.
    pub fn run(&self, table: &Table, config: &PipelineConfig) -> Result<ApplyOutcome> {
        let table = match self {
            Self::RemoveColumns { columns } => remove_columns(table, columns)?,
            Self::DropMissingRows { columns } => drop_rows_with_missing(table, columns)?,
            Self::Impute { columns, method } => {
                StatisticalImputer::impute(table, columns, *method)?
            }
            Self::OneHotEncode { columns } => one_hot_encode(table, columns)?,
            Self::LabelEncode { columns } => label_encode(table, columns)?,
            Self::StandardScale { columns } => standard_scale(table, columns)?,
            Self::MinMaxScale { columns, range } => {
                min_max_scale(table, columns, range.unwrap_or(config.min_max_range))?
            }
            Self::DetectOutliersIqr { column } => {
                let set = IqrDetector::new(config.iqr_multiplier).detect(table, column)?;
                return Ok(ApplyOutcome::Outliers(set));
            }
            Self::DetectOutliersZscore { column } => {
                let set = ZScoreDetector::new(config.zscore_threshold).detect(table, column)?;
                return Ok(ApplyOutcome::Outliers(set));
            }
            Self::RemoveOutliers { column, outliers } => remove_outliers(table, column, outliers)?,
            Self::TransformOutliers { column, outliers } => {
                transform_outliers(table, column, outliers)?
            }
        };
        Ok(ApplyOutcome::Table(table))
    }
}
