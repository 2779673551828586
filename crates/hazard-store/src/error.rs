//! Error types for the chunked array store.

use hazard_common::GridError;
use thiserror::Error;

/// Errors that can occur while writing or reading stored grids.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No artifact is stored at the path.
    #[error("no grid stored at '{0}'")]
    NotFound(String),

    /// The path is not a valid relative store path.
    #[error("invalid store path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Stored attributes could not be interpreted.
    #[error("invalid grid metadata at '{path}': {message}")]
    InvalidMetadata { path: String, message: String },

    /// The x and y query sequences have different lengths.
    #[error("query length mismatch: {x_len} x values, {y_len} y values")]
    QueryLengthMismatch { x_len: usize, y_len: usize },

    /// A query coordinate lies below every value of a stored axis.
    #[error("query {index} on axis '{axis}' has no floor: {value} is below the axis minimum {min}")]
    FloorOutOfRange {
        index: usize,
        axis: String,
        value: f64,
        min: f64,
    },

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    Zarr(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Grid construction error while decoding an artifact.
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl StoreError {
    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a Zarr error.
    pub fn zarr(err: impl ToString) -> Self {
        Self::Zarr(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Zarr(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
