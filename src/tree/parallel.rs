//! Batched point lookups fanned out over a [`QueryPool`].
//!
//! The batch is cut into one contiguous slice per worker. Each worker runs
//! ordinary root-to-leaf descents over its slice and accumulates into its
//! own [`PaddedSlot`], so no two workers write to the same cache line. After
//! the scope joins, the slots are reduced on the calling thread in worker
//! order.

use crate::key::{Accumulate, TreeKey, TreeValue};
use crate::pool::{PaddedSlot, QueryPool};
use crate::tracing_helpers::debug_log;

use super::BPlusTree;

/// Aggregate of a batched lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParFindResult<A> {
    /// Number of batch keys present in the tree. A key repeated in the batch
    /// counts once per occurrence.
    pub found: usize,

    /// Sum of the values of the found keys.
    pub value_sum: A,
}

/// One worker's running totals.
#[derive(Debug, Clone, Copy, Default)]
struct Partial<A> {
    found: usize,
    acc: A,
    comparisons: u64,
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Count how many of `keys` are present, using every worker of `pool`.
    ///
    /// The result does not depend on the number of workers.
    ///
    /// ```rust
    /// use bptree::{BPlusTree, QueryPool};
    ///
    /// let tree: BPlusTree<u64, u64> = (0..100).map(|k| (k * 2, k)).collect();
    /// let pool = QueryPool::new(2).unwrap();
    /// let batch: Vec<u64> = (0..50).collect();
    ///
    /// assert_eq!(tree.par_find(&batch, &pool), 25);
    /// ```
    #[must_use]
    pub fn par_find(&self, keys: &[K], pool: &QueryPool) -> usize {
        self.par_find_with(keys, pool, |(), _| (), |(), ()| ()).found
    }

    /// Shared fan-out: `fold` adds a found value to a worker's accumulator,
    /// `combine` merges two workers' accumulators.
    fn par_find_with<A, F, C>(
        &self,
        keys: &[K],
        pool: &QueryPool,
        fold: F,
        combine: C,
    ) -> ParFindResult<A>
    where
        A: Copy + Default + Send,
        F: Fn(A, &V) -> A + Sync,
        C: Fn(A, A) -> A,
    {
        let workers = pool.workers();
        let chunk = keys.len().div_ceil(workers).max(1);
        let mut slots: Vec<PaddedSlot<Partial<A>>> = vec![PaddedSlot::default(); workers];

        debug_log!(batch = keys.len(), workers, chunk, "par_find fan-out");

        let fold = &fold;
        pool.scope(|scope| {
            for (slot, part) in slots.iter_mut().zip(keys.chunks(chunk)) {
                scope.spawn(move |_| {
                    let mut local = Partial::default();
                    for key in part {
                        if let Some(value) = self.find_counted(key, &mut local.comparisons) {
                            local.found += 1;
                            local.acc = fold(local.acc, value);
                        }
                    }
                    **slot = local;
                });
            }
        });

        let mut result = ParFindResult::default();
        let mut comparisons: u64 = 0;
        for slot in &slots {
            result.found += slot.found;
            result.value_sum = combine(result.value_sum, slot.acc);
            comparisons += slot.comparisons;
        }
        self.record_comparisons(comparisons);

        result
    }
}

impl<K: TreeKey, V: TreeValue + Accumulate, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Like [`par_find`](Self::par_find), also summing the values of the
    /// found keys.
    #[must_use]
    pub fn par_find_values(&self, keys: &[K], pool: &QueryPool) -> ParFindResult<V::Acc> {
        self.par_find_with(
            keys,
            pool,
            |acc, value: &V| V::combine(acc, value.widen()),
            V::combine,
        )
    }
}
