//! Imputation module for handling missing values.
//!
//! This module provides statistical imputation (mean, median, mode).

mod statistical;

pub use statistical::{ImputeMethod, StatisticalImputer};
