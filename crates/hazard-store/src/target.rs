//! Read and write capabilities of a grid store.

use hazard_common::DerivedGrid;

use crate::error::Result;
use crate::types::GridWriteResult;

/// Persist derived grids at store paths.
pub trait WriteGrid: Send + Sync {
    /// Write `grid` at `path`, replacing any previous artifact.
    ///
    /// Readers observe either the previous artifact or the complete new one.
    fn write(&self, path: &str, grid: &DerivedGrid) -> Result<GridWriteResult>;
}

/// Retrieve derived grids from store paths.
pub trait ReadGrid: Send + Sync {
    /// Read the full grid stored at `path`.
    fn read(&self, path: &str) -> Result<DerivedGrid>;

    /// Sample the grid at `path` at paired `(x[i], y[i])` coordinates.
    ///
    /// `x` is matched against longitude and `y` against latitude, each
    /// floored to the largest stored coordinate not exceeding it.
    fn read_floored(&self, path: &str, x: &[f64], y: &[f64]) -> Result<Vec<f32>>;

    /// True when an artifact exists at `path`.
    fn exists(&self, path: &str) -> Result<bool>;
}

/// A store that can both write and read grids.
pub trait GridStore: ReadGrid + WriteGrid {}

impl<T: ReadGrid + WriteGrid + ?Sized> GridStore for T {}
