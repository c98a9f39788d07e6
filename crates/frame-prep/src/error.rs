//! Custom error types for the preparation pipeline.
//!
//! Every failure is returned as a value built with `thiserror`. Each variant
//! has a stable [`PrepError::error_code`] so a frontend can react to specific
//! kinds without parsing messages.
//!
//! Errors are serializable as `{ "code", "message" }` for IPC boundaries.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for table operations and the pipeline state.
#[derive(Error, Debug)]
pub enum PrepError {
    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    UnknownColumn(String),

    /// A numeric statistic was requested on a column that is not numeric.
    #[error("Column '{column}' has type {dtype}, expected a numeric column")]
    NonNumericColumn { column: String, dtype: String },

    /// Zero variance or zero range makes the requested operation undefined.
    #[error("Column '{column}' is degenerate: {reason}")]
    DegenerateColumn { column: String, reason: String },

    /// The operation requires at least one column but none were given.
    #[error("Operation '{0}' requires at least one column")]
    EmptySelection(&'static str),

    /// An outlier index set was used against a table it was not computed from.
    #[error(
        "Outlier index set for column '{column}' was computed against table generation \
         {expected}, but the current table is generation {actual}"
    )]
    StaleIndexSet {
        column: String,
        expected: u64,
        actual: u64,
    },

    /// An operation would produce a column name that already exists.
    #[error("Column '{0}' already exists in table")]
    DuplicateColumn(String),

    /// No present values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// A parameter is out of its valid domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The pipeline state holds no table yet.
    #[error("No data loaded")]
    NoDataLoaded,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ConfigValidationError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PrepError>,
    },
}

impl PrepError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PrepError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownColumn(_) => "UNKNOWN_COLUMN",
            Self::NonNumericColumn { .. } => "NON_NUMERIC_COLUMN",
            Self::DegenerateColumn { .. } => "DEGENERATE_COLUMN",
            Self::EmptySelection(_) => "EMPTY_SELECTION",
            Self::StaleIndexSet { .. } => "STALE_INDEX_SET",
            Self::DuplicateColumn(_) => "DUPLICATE_COLUMN",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::InvalidParameter(_) => "INVALID_PARAMETER",
            Self::NoDataLoaded => "NO_DATA_LOADED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Strip any context wrappers and return the underlying error.
    pub fn root(&self) -> &PrepError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error is caused by user input rather than by the data
    /// or the environment. Such errors can be fixed by changing the request.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.root(),
            Self::UnknownColumn(_)
                | Self::EmptySelection(_)
                | Self::StaleIndexSet { .. }
                | Self::DuplicateColumn(_)
                | Self::InvalidParameter(_)
                | Self::NoDataLoaded
                | Self::InvalidConfig(_)
        )
    }

    pub(crate) fn non_numeric(column: &str, dtype: &polars::prelude::DataType) -> Self {
        Self::NonNumericColumn {
            column: column.to_string(),
            dtype: dtype.to_string(),
        }
    }

    pub(crate) fn degenerate(column: &str, reason: impl Into<String>) -> Self {
        Self::DegenerateColumn {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PrepError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PrepError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preparation operations.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PrepError::Polars(e).with_context(context))
    }
}
