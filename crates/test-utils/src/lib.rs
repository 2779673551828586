//! Shared test utilities for the climate hazard workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic yearly datasets with known values
//! - The averaged 3x3 regression fixture used by floored-read tests
//! - Approximate equality assertions
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// True when `left` and `right` differ by at most `epsilon`.
///
/// Two NaNs compare equal, so grids with missing cells can be checked
/// cell by cell.
pub fn approx_eq(left: f64, right: f64, epsilon: f64) -> bool {
    (left.is_nan() && right.is_nan()) || (left - right).abs() <= epsilon
}

/// Assert two numbers are within `epsilon` of each other.
///
/// ```ignore
/// assert_approx_eq!(annual[0], 365.0, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right) = ($left as f64, $right as f64);
        assert!(
            $crate::approx_eq(left, right, $epsilon as f64),
            "assertion failed: {} ≈ {} (epsilon {})",
            left,
            right,
            $epsilon
        );
    }};
}

/// Assert two sequences have the same length and are pairwise within `epsilon`.
#[macro_export]
macro_rules! assert_slice_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right) = (&$left, &$right);
        assert_eq!(left.len(), right.len(), "lengths differ");
        for (index, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            assert!(
                $crate::approx_eq(*l as f64, *r as f64, $epsilon as f64),
                "mismatch at index {}: {} vs {} (epsilon {})",
                index,
                l,
                r,
                $epsilon
            );
        }
    }};
}
