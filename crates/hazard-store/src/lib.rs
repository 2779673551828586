//! Chunked, coordinate-addressable storage for derived hazard grids.
//!
//! Grids are written once per store path and read back either whole or by
//! point sampling, where each query coordinate is floored onto the stored
//! axes:
//!
//! ```text
//! write(path, grid)                 -> chunked Zarr V3 array at {root}/{path}
//! read(path)                        -> DerivedGrid with coordinates and attributes
//! read_floored(path, x[], y[])      -> one value per (x[i], y[i]) pair
//! ```
//!
//! [`ZarrGridStore`] persists to the local filesystem; [`MemoryGridStore`]
//! keeps grids in a map for tests and dry runs.

pub mod cache;
pub mod config;
pub mod error;
pub mod floor;
pub mod memory;
pub mod path;
pub mod target;
pub mod types;
pub mod zarr;

pub use cache::{artifact_id, ChunkCache, ChunkKey};
pub use config::{StoreConfig, ZarrCompression};
pub use error::{Result, StoreError};
pub use floor::floor_cells;
pub use memory::MemoryGridStore;
pub use path::{path_segments, validate_path};
pub use target::{GridStore, ReadGrid, WriteGrid};
pub use types::{CacheStats, GridWriteResult, StoredGridMetadata};
pub use zarr::{ZarrGridStore, STAGING_DIR};
