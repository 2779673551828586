//! Metadata and statistics types for stored grids.

use serde::{Deserialize, Serialize};

/// Layout of a stored grid, decoded from its array metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGridMetadata {
    /// Grid dimensions as (rows, cols).
    pub shape: (usize, usize),
    /// Chunk dimensions as (rows, cols).
    pub chunk_shape: (usize, usize),
    /// Central year the grid was computed for.
    pub central_year: i32,
}

impl StoredGridMetadata {
    /// Number of chunks along each dimension as (rows, cols).
    pub fn num_chunks(&self) -> (usize, usize) {
        (
            self.shape.0.div_ceil(self.chunk_shape.0),
            self.shape.1.div_ceil(self.chunk_shape.1),
        )
    }

    /// Chunk holding a (row, col) cell.
    pub fn chunk_of(&self, row: usize, col: usize) -> (usize, usize) {
        (row / self.chunk_shape.0, col / self.chunk_shape.1)
    }

    /// Actual (rows, cols) of a chunk, smaller than `chunk_shape` at the far edges.
    pub fn chunk_extent(&self, chunk_row: usize, chunk_col: usize) -> (usize, usize) {
        let start_row = chunk_row * self.chunk_shape.0;
        let start_col = chunk_col * self.chunk_shape.1;
        (
            (start_row + self.chunk_shape.0).min(self.shape.0) - start_row,
            (start_col + self.chunk_shape.1).min(self.shape.1) - start_col,
        )
    }
}

/// Summary of one completed write.
#[derive(Debug, Clone, PartialEq)]
pub struct GridWriteResult {
    /// Store path the grid now lives at.
    pub path: String,
    /// Grid dimensions as (rows, cols).
    pub shape: (usize, usize),
    /// Uncompressed payload size.
    pub bytes_written: u64,
}

/// Chunk cache statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub memory_bytes: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
