//! Outlier engine.
//!
//! Detection produces an [`OutlierIndexSet`] for one column of one table
//! snapshot; treatments consume it to remove the flagged rows or to replace
//! the flagged cells with the median of the remaining values.

mod detection;
mod treatment;

pub use detection::{
    DetectionMethod, DetectionStats, IqrDetector, OutlierDetector, OutlierIndexSet,
    ZScoreDetector, detect_outliers_iqr, detect_outliers_zscore,
};
pub use treatment::{remove_outliers, transform_outliers};
