//! Worker pool for parallel queries.
//!
//! Parallel operations take a [`QueryPool`] argument instead of using the
//! process-wide rayon pool, so the worker count is explicit and a test can
//! run the same query on 1, 2 or 8 workers side by side.
//!
//! [`PaddedSlot`] gives each worker its own cache line for partial results.

use std::fmt as StdFmt;
use std::num::NonZeroUsize;
use std::ops::{Deref, DerefMut};

use rayon::{Scope, ThreadPool, ThreadPoolBuilder};

use crate::tracing_helpers::debug_log;
use crate::tree::TreeError;

/// Cache line size assumed for padding.
pub const CACHE_LINE: usize = 64;

// ============================================================================
//  QueryPool
// ============================================================================

/// A fork-join pool with a fixed number of workers.
pub struct QueryPool {
    pool: ThreadPool,
    workers: usize,
}

impl StdFmt::Debug for QueryPool {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("QueryPool")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl QueryPool {
    /// Start a pool with exactly `workers` threads.
    ///
    /// # Errors
    ///
    /// - [`TreeError::InvalidWorkerCount`] if `workers` is zero
    /// - [`TreeError::PoolBuild`] if the threads cannot be spawned
    pub fn new(workers: usize) -> Result<Self, TreeError> {
        if workers == 0 {
            return Err(TreeError::InvalidWorkerCount);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("bptree-query-{i}"))
            .build()
            .map_err(|err| TreeError::PoolBuild(err.to_string()))?;

        debug_log!(workers, "query pool started");

        Ok(Self { pool, workers })
    }

    /// Start a pool with one worker per available hardware thread.
    ///
    /// # Errors
    ///
    /// See [`QueryPool::new`].
    pub fn with_available_parallelism() -> Result<Self, TreeError> {
        let workers = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self::new(workers)
    }

    /// Number of workers.
    #[must_use]
    #[inline(always)]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Run `op` inside the pool; rayon calls made by `op` use these workers.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Open a fork-join scope on the pool. Returns once every spawned task
    /// has finished.
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.pool.scope(op)
    }
}

// ============================================================================
//  PaddedSlot
// ============================================================================

/// A value alone on its own cache line.
///
/// Workers that write to neighbouring slots in a `Vec<PaddedSlot<T>>` never
/// share a line, so their updates do not contend.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[repr(C, align(64))]
pub struct PaddedSlot<T> {
    value: T,
}

impl<T> PaddedSlot<T> {
    /// Wrap `value`.
    #[must_use]
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Unwrap the value.
    #[must_use]
    #[inline(always)]
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for PaddedSlot<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for PaddedSlot<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: StdFmt::Debug> StdFmt::Debug for PaddedSlot<T> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_tuple("PaddedSlot").field(&self.value).finish()
    }
}
