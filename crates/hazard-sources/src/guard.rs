//! Scoped ownership of opened yearly grids.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use hazard_common::YearlyGrid;

type ReleaseHook<'a> = Box<dyn FnOnce() + Send + 'a>;

/// An opened yearly grid whose backing handle is released on drop.
///
/// The release hook runs exactly once, on every exit path of the caller's
/// scope, including early returns through `?` and unwinding panics.
pub struct DatasetGuard<'a> {
    grid: YearlyGrid,
    release: Option<ReleaseHook<'a>>,
}

impl<'a> DatasetGuard<'a> {
    /// Wrap a grid that needs no cleanup.
    pub fn new(grid: YearlyGrid) -> Self {
        Self {
            grid,
            release: None,
        }
    }

    /// Wrap a grid with a release hook.
    pub fn with_release(grid: YearlyGrid, release: impl FnOnce() + Send + 'a) -> Self {
        Self {
            grid,
            release: Some(Box::new(release)),
        }
    }

    pub fn grid(&self) -> &YearlyGrid {
        &self.grid
    }
}

impl Deref for DatasetGuard<'_> {
    type Target = YearlyGrid;

    fn deref(&self) -> &YearlyGrid {
        &self.grid
    }
}

impl Drop for DatasetGuard<'_> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for DatasetGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetGuard")
            .field("quantity", &self.grid.quantity())
            .field("year", &self.grid.year())
            .field("shape", &self.grid.shape())
            .finish()
    }
}

/// Counts handles a source has handed out and not yet had released.
#[derive(Debug, Default)]
pub struct HandleTracker {
    open: AtomicUsize,
}

impl HandleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened grid and return a guard that releases it.
    pub fn track(&self, grid: YearlyGrid) -> DatasetGuard<'_> {
        self.open.fetch_add(1, Ordering::SeqCst);
        let quantity = grid.quantity().to_string();
        let year = grid.year();
        DatasetGuard::with_release(grid, move || {
            self.open.fetch_sub(1, Ordering::SeqCst);
            tracing::trace!(quantity = %quantity, year, "Released dataset handle");
        })
    }

    /// Number of grids currently open.
    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}
