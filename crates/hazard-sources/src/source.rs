//! The dataset source capability.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::guard::DatasetGuard;

/// Chunking hint passed through to backends that read in pieces.
///
/// `time` is the number of daily steps fetched per read; `None` lets the
/// backend read the whole year at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkHint {
    pub time: Option<usize>,
}

impl ChunkHint {
    pub fn time_steps(time: usize) -> Self {
        Self { time: Some(time) }
    }
}

/// Opens yearly gridded datasets for a global circulation model (GCM),
/// scenario and physical quantity.
///
/// Implementations must be shareable across worker threads; each call hands
/// out an independent guard, so concurrent items never share a grid.
pub trait OpenDataset: Send + Sync {
    /// Identifiers of the GCMs this source can serve.
    fn gcms(&self) -> Vec<String>;

    /// Open one full year of daily values.
    ///
    /// The returned guard owns the grid; its handle is released when the
    /// guard is dropped.
    fn open_dataset_year(
        &self,
        gcm: &str,
        scenario: &str,
        quantity: &str,
        year: i32,
        chunks: Option<ChunkHint>,
    ) -> Result<DatasetGuard<'_>>;
}
