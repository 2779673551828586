//! In-memory grid store.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use hazard_common::DerivedGrid;

use crate::error::{Result, StoreError};
use crate::floor::floor_cells;
use crate::path::validate_path;
use crate::target::{ReadGrid, WriteGrid};
use crate::types::GridWriteResult;

/// Grid store backed by a map, for tests and dry runs.
///
/// Writes swap the whole grid under a lock, so readers never see a partial
/// artifact.
#[derive(Debug, Default)]
pub struct MemoryGridStore {
    grids: RwLock<HashMap<String, DerivedGrid>>,
}

impl MemoryGridStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored paths in sorted order.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.grids.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.grids.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.read().is_empty()
    }
}

impl WriteGrid for MemoryGridStore {
    fn write(&self, path: &str, grid: &DerivedGrid) -> Result<GridWriteResult> {
        validate_path(path)?;
        self.grids.write().insert(path.to_string(), grid.clone());
        debug!(path = %path, "Stored grid in memory");
        Ok(GridWriteResult {
            path: path.to_string(),
            shape: grid.shape(),
            bytes_written: std::mem::size_of_val(grid.data()) as u64,
        })
    }
}

impl ReadGrid for MemoryGridStore {
    fn read(&self, path: &str) -> Result<DerivedGrid> {
        validate_path(path)?;
        self.grids
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn read_floored(&self, path: &str, x: &[f64], y: &[f64]) -> Result<Vec<f32>> {
        validate_path(path)?;
        let grids = self.grids.read();
        let grid = grids
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let cols = grid.shape().1;
        let cells = floor_cells(grid.lat(), grid.lon(), x, y)?;
        Ok(cells
            .into_iter()
            .map(|(row, col)| grid.data()[row * cols + col])
            .collect())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        validate_path(path)?;
        Ok(self.grids.read().contains_key(path))
    }
}
