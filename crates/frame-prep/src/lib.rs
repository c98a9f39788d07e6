//! Tabular Data Preparation Library
//!
//! A stateful, in-memory data preparation core built on Polars.
//!
//! # Overview
//!
//! A user loads a table and applies one operation at a time:
//!
//! - **Column Removal**: drop selected columns
//! - **Missing Values**: drop incomplete rows or impute with mean, median or mode
//! - **Encoding**: one-hot indicators or label codes for categorical columns
//! - **Scaling**: standardization and min-max scaling
//! - **Outliers**: IQR or Z-score detection, then row removal or
//!   replacement with the median of the remaining values
//!
//! Every operation takes a [`Table`] and returns a new one. The
//! [`PipelineState`] keeps the working table, the original table for reset,
//! and a bounded history of applied operations.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use frame_prep::{ApplyOutcome, ImputeMethod, Operation, PipelineState, io::read_table};
//!
//! let mut state = PipelineState::new();
//! state.load(read_table("data.csv")?);
//!
//! state.apply(&Operation::Impute {
//!     columns: vec!["age".into()],
//!     method: ImputeMethod::Median,
//! })?;
//!
//! // Detection is read-only and returns the flagged rows
//! let detect = Operation::DetectOutliersIqr { column: "fare".into() };
//! if let ApplyOutcome::Outliers(outliers) = state.apply(&detect)? {
//!     println!("{} outliers detected", outliers.len());
//!
//!     // The index set is only valid against the table it was computed from
//!     state.apply(&Operation::TransformOutliers {
//!         column: "fare".into(),
//!         outliers,
//!     })?;
//! }
//!
//! let csv = state.export_csv()?;
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to tune detector thresholds and history size:
//!
//! ```rust,ignore
//! let config = PipelineConfig::builder()
//!     .iqr_multiplier(3.0)
//!     .zscore_threshold(2.5)
//!     .build()?;
//! let state = PipelineState::with_config(config)?;
//! ```
//!
//! # Missing Values
//!
//! A cell is missing when it is null, or NaN in a floating point column.
//! Statistics are always computed over present values only.

pub mod cleaner;
pub mod config;
pub mod encoders;
pub mod error;
pub mod export;
pub mod imputers;
pub mod io;
pub mod outliers;
pub mod pipeline;
pub mod scalers;
pub mod table;
pub mod utils;

pub use cleaner::{drop_rows_with_missing, remove_columns};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use encoders::{label_encode, one_hot_encode};
pub use error::{PrepError, Result, ResultExt};
pub use imputers::{ImputeMethod, StatisticalImputer};
pub use outliers::{
    DetectionMethod, DetectionStats, IqrDetector, OutlierDetector, OutlierIndexSet,
    ZScoreDetector, detect_outliers_iqr, detect_outliers_zscore, remove_outliers,
    transform_outliers,
};
pub use pipeline::{ApplyOutcome, Operation, OperationRecord, PipelineState};
pub use scalers::{min_max_scale, standard_scale};
pub use table::Table;
pub use utils::ColumnKind;
