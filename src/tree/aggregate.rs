//! Whole-tree reductions.
//!
//! [`BPlusTree::sum`] walks the leaf chain and folds each leaf's key array
//! directly, skipping per-entry cursor bookkeeping. [`BPlusTree::psum`]
//! splits the tree at internodes, sums subtrees on the query pool, and
//! combines partial results. Addition in [`Accumulate`] wraps, so both give
//! bit-identical results.

use rayon::prelude::*;

use crate::alloc::NodeRef;
use crate::key::{Accumulate, TreeKey, TreeValue};
use crate::leaf::LeafNode;
use crate::pool::QueryPool;
use crate::tracing_helpers::debug_log;

use super::BPlusTree;

/// Subtrees whose root internode is at most this high are summed on one
/// worker. Height 1 covers up to `(WIDTH + 1)^2` leaves, enough work to
/// amortize a task.
pub const PSUM_SEQUENTIAL_HEIGHT: u16 = 1;

impl<K: TreeKey + Accumulate, V: TreeValue, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Sum of all keys, walking the leaf chain.
    #[must_use]
    pub fn sum(&self) -> K::Acc {
        self.fold_leaf_chain(K::Acc::default(), |acc, leaf| K::fold_slice(acc, leaf.keys()))
    }

    /// Sum of all keys through the ordered iterator.
    ///
    /// Same result as [`sum`](Self::sum); kept to measure iterator overhead.
    #[must_use]
    pub fn sum_iter(&self) -> K::Acc {
        self.keys()
            .fold(K::Acc::default(), |acc, key| K::combine(acc, key.widen()))
    }

    /// Sum of all keys, computed in parallel on `pool`.
    ///
    /// Forking starts only at internodes above [`PSUM_SEQUENTIAL_HEIGHT`],
    /// so a tree of three or fewer levels is summed by a single worker. At
    /// the default width that covers up to roughly 4 000 entries.
    #[must_use]
    pub fn psum(&self, pool: &QueryPool) -> K::Acc {
        pool.install(|| {
            self.par_fold_subtree(
                self.root(),
                &|leaf: &LeafNode<K, V, WIDTH>| K::fold_slice(K::Acc::default(), leaf.keys()),
                &K::combine,
            )
        })
    }
}

impl<K: TreeKey, V: TreeValue + Accumulate, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Sum of all values, walking the leaf chain.
    #[must_use]
    pub fn sum_values(&self) -> V::Acc {
        self.fold_leaf_chain(V::Acc::default(), |acc, leaf| V::fold_slice(acc, leaf.values()))
    }

    /// Sum of all values, computed in parallel on `pool`.
    ///
    /// Small trees are summed by one worker, as in [`psum`](Self::psum).
    #[must_use]
    pub fn psum_values(&self, pool: &QueryPool) -> V::Acc {
        pool.install(|| {
            self.par_fold_subtree(
                self.root(),
                &|leaf: &LeafNode<K, V, WIDTH>| V::fold_slice(V::Acc::default(), leaf.values()),
                &V::combine,
            )
        })
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Fold every leaf, left to right, along sibling links.
    fn fold_leaf_chain<A, F>(&self, init: A, mut f: F) -> A
    where
        F: FnMut(A, &LeafNode<K, V, WIDTH>) -> A,
    {
        let mut acc = init;
        let mut cursor = Some(self.leftmost_leaf());
        while let Some(id) = cursor {
            let leaf = self.arena().leaf(id);
            acc = f(acc, leaf);
            cursor = leaf.next();
        }
        acc
    }

    /// Fold the subtree under `node`, forking at internodes above
    /// [`PSUM_SEQUENTIAL_HEIGHT`].
    fn par_fold_subtree<A, L, C>(&self, node: NodeRef, leaf_fold: &L, combine: &C) -> A
    where
        A: Copy + Default + Send,
        L: Fn(&LeafNode<K, V, WIDTH>) -> A + Sync,
        C: Fn(A, A) -> A + Sync,
    {
        match node {
            NodeRef::Leaf(id) => leaf_fold(self.arena().leaf(id)),

            NodeRef::Internode(id) => {
                let internode = self.arena().internode(id);
                if internode.height() <= PSUM_SEQUENTIAL_HEIGHT {
                    return self.fold_subtree(node, leaf_fold, combine);
                }

                debug_log!(
                    height = internode.height(),
                    fanout = internode.nchildren(),
                    "psum fork"
                );

                (0..internode.nchildren())
                    .into_par_iter()
                    .map(|i| self.par_fold_subtree(internode.child(i), leaf_fold, combine))
                    .reduce(A::default, |a, b| combine(a, b))
            }
        }
    }

    /// Sequential fold of the subtree under `node`.
    fn fold_subtree<A, L, C>(&self, node: NodeRef, leaf_fold: &L, combine: &C) -> A
    where
        A: Copy + Default,
        L: Fn(&LeafNode<K, V, WIDTH>) -> A,
        C: Fn(A, A) -> A,
    {
        match node {
            NodeRef::Leaf(id) => leaf_fold(self.arena().leaf(id)),

            NodeRef::Internode(id) => self
                .arena()
                .internode(id)
                .children()
                .fold(A::default(), |acc, child| {
                    combine(acc, self.fold_subtree(child, leaf_fold, combine))
                }),
        }
    }
}
