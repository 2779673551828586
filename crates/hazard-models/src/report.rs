//! Outcome of a batch run.

use std::time::Duration;

use hazard_common::BatchItem;

use crate::error::{ModelError, Result};

/// An item whose grid was computed and written.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSuccess {
    pub item: BatchItem,
    pub path: String,
    /// Grid dimensions as (rows, cols).
    pub shape: (usize, usize),
    pub bytes_written: u64,
    pub duration: Duration,
}

/// An item that failed; nothing was written for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub item: BatchItem,
    pub path: String,
    pub error: String,
}

/// Per-item results of a batch, in item order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub completed: Vec<ItemSuccess>,
    pub failed: Vec<ItemFailure>,
}

impl RunReport {
    /// Total number of items attempted.
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    /// True when no item failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Paths written by this run.
    pub fn written_paths(&self) -> Vec<&str> {
        self.completed.iter().map(|s| s.path.as_str()).collect()
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: RunReport) {
        self.completed.extend(other.completed);
        self.failed.extend(other.failed);
    }

    /// Completed items, or [`ModelError::BatchFailed`] if any item failed.
    pub fn into_result(self) -> Result<Vec<ItemSuccess>> {
        match self.failed.first() {
            None => Ok(self.completed),
            Some(first) => Err(ModelError::BatchFailed {
                failed: self.failed.len(),
                total: self.completed.len() + self.failed.len(),
                first: format!("{}: {}", first.item, first.error),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(year: i32) -> ItemSuccess {
        ItemSuccess {
            item: BatchItem::new("g", "s", year),
            path: format!("x/g/s/{}", year),
            shape: (1, 1),
            bytes_written: 4,
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_successful_report() {
        let report = RunReport {
            completed: vec![success(2030), success(2040)],
            failed: vec![],
        };
        assert!(report.is_success());
        assert_eq!(report.total(), 2);
        assert_eq!(report.written_paths(), vec!["x/g/s/2030", "x/g/s/2040"]);
        assert_eq!(report.into_result().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_report() {
        let mut report = RunReport {
            completed: vec![success(2030)],
            failed: vec![],
        };
        report.merge(RunReport {
            completed: vec![],
            failed: vec![ItemFailure {
                item: BatchItem::new("g", "s", 2040),
                path: "x/g/s/2040".into(),
                error: "missing year".into(),
            }],
        });
        assert!(!report.is_success());
        match report.into_result() {
            Err(ModelError::BatchFailed { failed, total, first }) => {
                assert_eq!((failed, total), (1, 2));
                assert_eq!(first, "g/s/2040: missing year");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
