/// Fixed-size worker pool for task graph execution.
///
/// Thin wrapper over a rayon ThreadPool. A task body may itself fan out
/// child sub-tasks with `rayon::scope` and block on the join; work-stealing
/// keeps bounded-depth nesting free of pool starvation.

use crate::error::{Error, Result};

/// Worker pool executing task graph bodies.
pub struct TaskPool {
    pool: rayon::ThreadPool,
}

impl TaskPool {
    /// Create a pool with a fixed number of worker threads.
    ///
    /// `worker_count` of 0 selects one worker per logical core.
    pub fn new(worker_count: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|index| format!("nova3d-worker-{}", index))
            .build()
            .map_err(|e| Error::InitializationFailed(format!("worker pool: {}", e)))?;

        Ok(Self { pool })
    }

    /// Number of worker threads in the pool.
    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool, blocking until it returns.
    pub(crate) fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}
