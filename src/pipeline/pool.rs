//! Bounded worker pool
//!
//! Fire-and-forget: tasks return nothing, and [`WorkerPool::run_all`]
//! returns once every task has finished. Tasks that spawn external tools get
//! process isolation from the child process itself.

use crate::Result;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Fixed-width pool of worker threads.
pub struct WorkerPool {
    name: &'static str,
    pool: ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `width` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns error if the OS refuses to spawn the worker threads.
    pub fn new(name: &'static str, width: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(width.max(1))
            .thread_name(move |i| format!("{name}-{i}"))
            .build()?;
        Ok(Self { name, pool })
    }

    /// Pool name (thread name prefix).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of workers.
    #[must_use]
    pub fn width(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Submit every task and block until all of them have finished.
    pub fn run_all<I, F>(&self, tasks: Vec<I>, task: F)
    where
        I: Send,
        F: Fn(I) + Send + Sync,
    {
        self.pool.install(|| tasks.into_par_iter().for_each(task));
    }

    /// Map every input on the pool, keeping input order in the output.
    pub fn map_all<I, O, F>(&self, inputs: Vec<I>, f: F) -> Vec<O>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> O + Send + Sync,
    {
        self.pool.install(|| inputs.into_par_iter().map(f).collect())
    }
}
