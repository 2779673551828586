//! In-memory dataset source.

use std::collections::{BTreeSet, HashMap};

use hazard_common::YearlyGrid;

use crate::error::{Result, SourceError};
use crate::guard::{DatasetGuard, HandleTracker};
use crate::source::{ChunkHint, OpenDataset};

type DatasetKey = (String, String, String, i32);

/// Dataset source over pre-built grids.
///
/// Opening a year clones its grid, so concurrent items never share buffers.
#[derive(Debug, Default)]
pub struct MemorySource {
    datasets: HashMap<DatasetKey, YearlyGrid>,
    tracker: HandleTracker,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source holding `grids` for a single gcm and scenario.
    pub fn from_grids(gcm: &str, scenario: &str, grids: impl IntoIterator<Item = YearlyGrid>) -> Self {
        let mut source = Self::new();
        for grid in grids {
            source.insert(gcm, scenario, grid);
        }
        source
    }

    /// Add a grid, keyed by its own quantity and year. Replaces any previous entry.
    pub fn insert(&mut self, gcm: &str, scenario: &str, grid: YearlyGrid) {
        let key = (
            gcm.to_string(),
            scenario.to_string(),
            grid.quantity().to_string(),
            grid.year(),
        );
        self.datasets.insert(key, grid);
    }

    /// Number of grids currently handed out and not yet released.
    pub fn open_handles(&self) -> usize {
        self.tracker.open_handles()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl OpenDataset for MemorySource {
    fn gcms(&self) -> Vec<String> {
        self.datasets
            .keys()
            .map(|(gcm, ..)| gcm.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn open_dataset_year(
        &self,
        gcm: &str,
        scenario: &str,
        quantity: &str,
        year: i32,
        _chunks: Option<ChunkHint>,
    ) -> Result<DatasetGuard<'_>> {
        let key = (
            gcm.to_string(),
            scenario.to_string(),
            quantity.to_string(),
            year,
        );
        let grid = self
            .datasets
            .get(&key)
            .ok_or_else(|| SourceError::not_found(gcm, scenario, quantity, year))?;
        Ok(self.tracker.track(grid.clone()))
    }
}
