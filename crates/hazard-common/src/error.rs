//! Error types for grid construction and validation.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised while building or validating grids and axes.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("axis '{0}' is empty")]
    EmptyAxis(String),

    #[error("axis '{name}' is not strictly monotonic at index {index}")]
    NonMonotonicAxis { name: String, index: usize },

    #[error("axis '{name}' contains a non-finite value at index {index}")]
    NonFiniteAxis { name: String, index: usize },

    #[error("data length {actual} does not match grid shape {shape:?} (expected {expected})")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("invalid window: {0}")]
    InvalidWindow(String),
}

impl GridError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(shape: &[usize], actual: usize) -> Self {
        Self::ShapeMismatch {
            shape: shape.to_vec(),
            expected: shape.iter().product(),
            actual,
        }
    }

    /// Create an InvalidIdentifier error.
    pub fn invalid_identifier(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            value: value.into(),
            reason: reason.into(),
        }
    }
}
