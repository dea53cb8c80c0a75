//! Error types for the tidy-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while building tables, fitting models or forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// A table does not have the expected shape or columns.
    #[error("schema error: {0}")]
    Schema(String),

    /// A column holds a different logical type than the operation needs.
    #[error("column `{column}` has type {got}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        got: String,
    },

    /// Two rows share the same key and index value.
    #[error("duplicate rows for key `{key}` at index `{index}`")]
    DuplicateKey { key: String, index: String },

    /// Text could not be parsed (formulas, periods, horizons).
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Underlying IO failure.
    #[error("io error: {0}")]
    Io(String),

    /// CSV reading or writing failed.
    #[error("csv error: {0}")]
    Csv(String),
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 24, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 24, got 5"
        );

        let err = ForecastError::TypeMismatch {
            column: "Month".to_string(),
            expected: "yearmonth".to_string(),
            got: "text".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "column `Month` has type text, expected yearmonth"
        );

        let err = ForecastError::DuplicateKey {
            key: "Victoria/Department stores".to_string(),
            index: "2018 Dec".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate rows for key `Victoria/Department stores` at index `2018 Dec`"
        );

        let err = ForecastError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: ForecastError = io.into();
        assert!(matches!(err, ForecastError::Io(msg) if msg.contains("missing.csv")));
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::Parse("bad".to_string());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
