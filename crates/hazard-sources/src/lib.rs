//! Dataset sources for yearly climate model output.
//!
//! A source opens one full year of daily values for a (gcm, scenario,
//! quantity, year) combination. Opened grids are handed out inside a
//! [`DatasetGuard`], which releases the underlying handle when dropped,
//! whether the caller finished normally or bailed out with an error.
//!
//! Backends:
//! - [`MemorySource`]: pre-loaded grids, used by tests and small runs
//! - [`ZarrYearSource`]: one Zarr V3 array per year on the local filesystem

pub mod error;
pub mod guard;
pub mod memory;
pub mod source;
pub mod zarr;

pub use error::{Result, SourceError};
pub use guard::{DatasetGuard, HandleTracker};
pub use memory::MemorySource;
pub use source::{ChunkHint, OpenDataset};
pub use zarr::{year_array_path, ZarrYearSource, ZarrYearWriter};
