//! Error types for tabtrain

use thiserror::Error;

/// Result type alias for tabtrain operations
pub type Result<T> = std::result::Result<T, TabTrainError>;

/// Main error type for the experiment runner
#[derive(Error, Debug)]
pub enum TabTrainError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Column '{column}' not found (from option '{key}')")]
    MissingColumn { key: String, column: String },

    #[error("Duplicate column role: {0}")]
    DuplicateRole(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Model persistence error: {0}")]
    PersistenceError(String),

    #[error("Model round-trip error: {0}")]
    RoundTripError(String),

    #[error("Missing metrics: {0}")]
    MissingMetrics(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for TabTrainError {
    fn from(err: polars::error::PolarsError) -> Self {
        TabTrainError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TabTrainError {
    fn from(err: serde_json::Error) -> Self {
        TabTrainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TabTrainError::MissingColumn {
            key: "labelColumn".to_string(),
            column: "Target".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Column 'Target' not found (from option 'labelColumn')"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TabTrainError = io_err.into();
        assert!(matches!(err, TabTrainError::IoError(_)));
    }
}
