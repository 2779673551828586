//! Error types for dataset sources.

use hazard_common::GridError;
use thiserror::Error;

/// Errors that can occur while opening or reading a yearly dataset.
#[derive(Error, Debug)]
pub enum SourceError {
    /// No dataset exists for the requested combination.
    #[error("dataset not found: {gcm}/{scenario}/{quantity}/{year}")]
    NotFound {
        gcm: String,
        scenario: String,
        quantity: String,
        year: i32,
    },

    /// The dataset exists but could not be read.
    #[error("failed to read dataset {path}: {message}")]
    Read { path: String, message: String },

    /// The dataset was written or read with inconsistent metadata.
    #[error("invalid dataset metadata at {path}: {message}")]
    InvalidMetadata { path: String, message: String },

    /// Storage/IO error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Grid construction error.
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl SourceError {
    /// Create a NotFound error.
    pub fn not_found(gcm: &str, scenario: &str, quantity: &str, year: i32) -> Self {
        Self::NotFound {
            gcm: gcm.to_string(),
            scenario: scenario.to_string(),
            quantity: quantity.to_string(),
            year,
        }
    }

    /// Create a Read error.
    pub fn read(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Read {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
