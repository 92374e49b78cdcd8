//! Error types for the tier-guard profiling library.
//!
//! All fallible operations return [`Result`], an alias over [`TierError`].
//! Statistical tests never fail on small or degenerate samples; they return
//! structured "not applicable" outcomes instead. Errors are reserved for
//! misconfiguration, missing columns, cancelled runs and I/O.

use thiserror::Error;

/// The main error type for the tier-guard library.
#[derive(Error, Debug)]
pub enum TierError {
    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required column is missing from the dataset.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Not enough usable values to compute a statistic.
    #[error("Insufficient data for {context}: required {required}, found {actual}")]
    InsufficientData {
        /// What was being computed
        context: String,
        /// Minimum number of usable values
        required: usize,
        /// Number of usable values found
        actual: usize,
    },

    /// The run was cancelled between stages.
    #[error("Profiling run cancelled during {stage}")]
    Cancelled { stage: String },

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The background task running the pipeline failed to join.
    #[error("Background task failed: {0}")]
    TaskJoin(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, TierError>`.
pub type Result<T> = std::result::Result<T, TierError>;

impl TierError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates an insufficient-data error.
    pub fn insufficient_data(context: impl Into<String>, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            required,
            actual,
        }
    }

    /// Creates a cancellation error for the named stage.
    pub fn cancelled(stage: impl Into<String>) -> Self {
        Self::Cancelled {
            stage: stage.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error reports a cancelled run.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<tokio::task::JoinError> for TierError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TierError::column_not_found("amount");
        assert_eq!(err.to_string(), "Column 'amount' not found in dataset");

        let err = TierError::insufficient_data("value thresholds", 1, 0);
        assert_eq!(
            err.to_string(),
            "Insufficient data for value thresholds: required 1, found 0"
        );
    }

    #[test]
    fn test_cancelled_predicate() {
        assert!(TierError::cancelled("aggregation").is_cancelled());
        assert!(!TierError::internal("boom").is_cancelled());
    }

    #[test]
    fn test_from_serde_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: TierError = parse_err.into();
        assert!(matches!(err, TierError::Serialization(_)));
    }
}
