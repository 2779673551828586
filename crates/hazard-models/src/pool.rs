//! Worker pool for parallel item execution.

use rayon::ThreadPool;

use crate::error::{ModelError, Result};

/// A fixed-size pool of worker threads that items are dispatched across.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Create a pool with `workers` threads (at least one).
    pub fn new(workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("hazard-worker-{}", i))
            .build()
            .map_err(|e| ModelError::InvalidConfig(format!("failed to build worker pool: {}", e)))?;
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool; parallel iterators in `op` use its threads.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers())
            .finish()
    }
}
