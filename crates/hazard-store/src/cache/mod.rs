//! Caching for decompressed chunks of stored grids.

mod chunk_cache;

pub use chunk_cache::{artifact_id, ChunkCache, ChunkKey};
