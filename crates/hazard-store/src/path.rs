//! Store path validation.
//!
//! A store path is a relative, `/`-separated sequence of identifier segments,
//! e.g. `chronic_heat/osc/v1/mean_degree_days_above_32c/NorESM2-MM/ssp585/2030`.

use hazard_common::validate_identifier;

use crate::error::{Result, StoreError};

/// Validate a store path and return its segments.
///
/// Rejects empty paths, absolute paths, empty segments and segments that are
/// not identifiers (which also rules out `.`, `..` and hidden names).
pub fn path_segments(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Err(StoreError::invalid_path(path, "path is empty"));
    }
    if path.starts_with('/') {
        return Err(StoreError::invalid_path(path, "path must be relative"));
    }

    path.split('/')
        .map(|segment| {
            if segment.is_empty() {
                return Err(StoreError::invalid_path(path, "empty path segment"));
            }
            validate_identifier(segment)
                .map_err(|e| StoreError::invalid_path(path, e.to_string()))?;
            Ok(segment)
        })
        .collect()
}

/// Validate a store path.
pub fn validate_path(path: &str) -> Result<()> {
    path_segments(path).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        assert_eq!(path_segments("a").unwrap(), vec!["a"]);
        assert_eq!(
            path_segments("chronic_heat/osc/v1/x/NorESM2-MM/ssp585/2030").unwrap().len(),
            7
        );
    }

    #[test]
    fn test_invalid_paths() {
        for bad in ["", "/abs", "a//b", "a/", "a/../b", "./a", "a/.staging/b", "a b"] {
            let err = validate_path(bad).unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidPath { .. }),
                "expected InvalidPath for {:?}",
                bad
            );
        }
    }
}
