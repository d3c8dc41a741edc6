//! Error types for the bmi_core library.

use crate::validation::ValidationErrors;
use crate::RecordId;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for bmi_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more measurement fields failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(ValidationErrors),

    /// Not enough history to draw a chart
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// No record with the given identifier
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::InvalidInput(errors)
    }
}

impl Error {
    /// Field-level validation errors, if this is an input error
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Error::InvalidInput(errors) => Some(errors),
            _ => None,
        }
    }
}
