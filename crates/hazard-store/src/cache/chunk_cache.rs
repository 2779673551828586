//! Memory-bounded LRU of decoded grid chunks.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::types::CacheStats;

/// Identifies one chunk of one written version of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub artifact: u64,
    pub chunk_row: usize,
    pub chunk_col: usize,
}

impl ChunkKey {
    pub fn new(artifact: u64, chunk_row: usize, chunk_col: usize) -> Self {
        Self {
            artifact,
            chunk_row,
            chunk_col,
        }
    }
}

/// Identity of an artifact as written: its path plus the write version.
///
/// A rewrite gets a new version, so chunks cached for the old array are
/// never returned for the new one; they simply age out.
pub fn artifact_id(path: &str, version: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    version.hash(&mut hasher);
    hasher.finish()
}

/// Decoded chunks shared with readers, evicted least-recently-used first
/// once the byte budget is exceeded.
pub struct ChunkCache {
    entries: LruCache<ChunkKey, Arc<[f32]>>,
    budget_bytes: usize,
    used_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl ChunkCache {
    /// `budget_bytes` bounds the decoded data held. `chunk_edge` is the
    /// configured chunk edge length, used to size the entry table.
    pub fn new(budget_bytes: usize, chunk_edge: usize) -> Self {
        let full_chunk = chunk_edge
            .saturating_mul(chunk_edge)
            .saturating_mul(std::mem::size_of::<f32>())
            .max(1);
        // Edge chunks are smaller than full ones, so allow extra slots.
        let slots = (budget_bytes / full_chunk).max(16);

        Self {
            entries: LruCache::new(NonZeroUsize::new(slots).unwrap_or(NonZeroUsize::MIN)),
            budget_bytes,
            used_bytes: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn get(&mut self, key: &ChunkKey) -> Option<Arc<[f32]>> {
        match self.entries.get(key) {
            Some(chunk) => {
                self.hits += 1;
                Some(Arc::clone(chunk))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Cache a decoded chunk. A chunk larger than the whole budget is not kept.
    pub fn insert(&mut self, key: ChunkKey, chunk: Arc<[f32]>) {
        let size = std::mem::size_of_val(&*chunk);
        if size > self.budget_bytes {
            return;
        }

        if let Some(previous) = self.entries.pop(&key) {
            self.used_bytes -= std::mem::size_of_val(&*previous);
        }
        while self.used_bytes + size > self.budget_bytes {
            let Some((_, evicted)) = self.entries.pop_lru() else {
                break;
            };
            self.used_bytes -= std::mem::size_of_val(&*evicted);
            self.evictions += 1;
        }

        // The slot bound can still push out an entry on its own.
        if let Some((_, evicted)) = self.entries.push(key, chunk) {
            self.used_bytes -= std::mem::size_of_val(&*evicted);
            self.evictions += 1;
        }
        self.used_bytes += size;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
            memory_bytes: self.used_bytes as u64,
            evictions: self.evictions,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.used_bytes = 0;
    }

    pub fn memory_usage(&self) -> usize {
        self.used_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(value: f32, len: usize) -> Arc<[f32]> {
        vec![value; len].into()
    }

    #[test]
    fn test_miss_then_hit() {
        let mut cache = ChunkCache::new(1 << 20, 2);
        let key = ChunkKey::new(7, 0, 1);

        assert!(cache.get(&key).is_none());
        cache.insert(key, chunk(1.5, 4));
        assert_eq!(cache.get(&key).as_deref(), Some(&[1.5_f32; 4][..]));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_budget_evicts_least_recently_used() {
        // 64 bytes: room for four 2x2 chunks.
        let mut cache = ChunkCache::new(64, 2);
        for row in 0..4 {
            cache.insert(ChunkKey::new(0, row, 0), chunk(row as f32, 4));
        }
        // Touch row 0 so row 1 becomes the oldest.
        assert!(cache.get(&ChunkKey::new(0, 0, 0)).is_some());
        cache.insert(ChunkKey::new(0, 4, 0), chunk(4.0, 4));

        assert!(cache.get(&ChunkKey::new(0, 1, 0)).is_none());
        assert!(cache.get(&ChunkKey::new(0, 0, 0)).is_some());
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.memory_usage(), 64);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_oversized_chunk_is_not_kept() {
        let mut cache = ChunkCache::new(16, 2);
        cache.insert(ChunkKey::new(0, 0, 0), chunk(1.0, 8));
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage(), 0);
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let mut cache = ChunkCache::new(1024, 2);
        let key = ChunkKey::new(0, 0, 0);
        cache.insert(key, chunk(1.0, 4));
        cache.insert(key, chunk(2.0, 2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.memory_usage(), 8);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage(), 0);
    }

    #[test]
    fn test_artifact_id_changes_with_version() {
        assert_eq!(artifact_id("a/b/2030", "v1"), artifact_id("a/b/2030", "v1"));
        assert_ne!(artifact_id("a/b/2030", "v1"), artifact_id("a/b/2030", "v2"));
        assert_ne!(artifact_id("a/b/2030", "v1"), artifact_id("a/b/2040", "v1"));
    }
}
