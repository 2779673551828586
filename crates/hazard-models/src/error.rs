//! Error types for indicator models and batch execution.

use hazard_common::GridError;
use hazard_sources::SourceError;
use hazard_store::StoreError;
use thiserror::Error;

/// Errors that can occur while computing or persisting an indicator.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A yearly dataset could not be opened or read.
    #[error("dataset source error: {0}")]
    Source(#[from] SourceError),

    /// The target store rejected a write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Contributing grids of one window cannot be combined.
    #[error("inconsistent window for year {year}: {reason}")]
    InconsistentWindow { year: i32, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// At least one item of a batch failed.
    #[error("{failed} of {total} items failed; first failure: {first}")]
    BatchFailed {
        failed: usize,
        total: usize,
        first: String,
    },

    #[error(transparent)]
    Grid(#[from] GridError),
}

impl ModelError {
    /// Create an InconsistentWindow error.
    pub fn inconsistent(year: i32, reason: impl Into<String>) -> Self {
        Self::InconsistentWindow {
            year,
            reason: reason.into(),
        }
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
