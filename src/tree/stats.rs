//! Shape and memory statistics.

use std::fmt as StdFmt;
use std::mem as StdMem;
use std::sync::atomic::Ordering as AtomicOrdering;

use crate::key::{TreeKey, TreeValue};

use super::BPlusTree;

/// Snapshot of a tree's shape.
///
/// All counts are exact; nothing is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Levels from root to leaves, inclusive.
    pub levels: usize,

    /// Total nodes (internodes plus leaves).
    pub node_count: usize,

    /// Internodes.
    pub internode_count: usize,

    /// Leaves.
    pub leaf_count: usize,

    /// Separator keys stored across all internodes.
    pub internal_elements: usize,

    /// Entries stored across all leaves (equals the tree's `len`).
    pub leaf_elements: usize,

    /// Bytes held by the tree: every node at its padded size plus the
    /// tree header.
    pub footprint_bytes: usize,

    /// Key comparisons performed so far.
    pub comparisons: u64,

    /// Node capacity.
    pub width: usize,
}

impl TreeStats {
    /// Fraction of internode key slots in use, `None` without internodes.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "statistic")]
    pub fn internal_density(&self) -> Option<f64> {
        (self.internode_count > 0).then(|| {
            self.internal_elements as f64 / (self.internode_count * self.width) as f64
        })
    }

    /// Fraction of leaf slots in use, `None` for an empty tree.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "statistic")]
    pub fn leaf_density(&self) -> Option<f64> {
        (self.leaf_elements > 0)
            .then(|| self.leaf_elements as f64 / (self.leaf_count * self.width) as f64)
    }
}

impl StdFmt::Display for TreeStats {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        writeln!(f, "levels:            {}", self.levels)?;
        writeln!(
            f,
            "nodes:             {} ({} internodes, {} leaves)",
            self.node_count, self.internode_count, self.leaf_count
        )?;
        writeln!(f, "internal elements: {}", self.internal_elements)?;
        writeln!(f, "leaf elements:     {}", self.leaf_elements)?;
        if let Some(d) = self.internal_density() {
            writeln!(f, "internal density:  {d:.3}")?;
        }
        if let Some(d) = self.leaf_density() {
            writeln!(f, "leaf density:      {d:.3}")?;
        }
        writeln!(f, "footprint:         {} bytes", self.footprint_bytes)?;
        write!(f, "comparisons:       {}", self.comparisons)
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Collect every statistic in one pass over the internodes.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            levels: self.levels(),
            node_count: self.node_count(),
            internode_count: self.internode_count(),
            leaf_count: self.leaf_count(),
            internal_elements: self.internal_elements(),
            leaf_elements: self.leaf_elements(),
            footprint_bytes: self.footprint_bytes(),
            comparisons: self.comparisons(),
            width: WIDTH,
        }
    }

    /// Levels from root to leaves, inclusive. An empty tree has 1.
    #[must_use]
    #[inline(always)]
    pub const fn levels(&self) -> usize {
        self.depth
    }

    /// Total nodes.
    #[must_use]
    #[inline]
    pub fn node_count(&self) -> usize {
        self.internode_count() + self.leaf_count()
    }

    /// Number of internodes.
    #[must_use]
    #[inline]
    pub fn internode_count(&self) -> usize {
        self.arena().internode_count()
    }

    /// Number of leaves.
    #[must_use]
    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.arena().leaf_count()
    }

    /// Separator keys across all internodes.
    #[must_use]
    pub fn internal_elements(&self) -> usize {
        self.arena().internodes().iter().map(|n| n.nkeys()).sum()
    }

    /// Entries across all leaves.
    #[must_use]
    #[inline(always)]
    pub const fn leaf_elements(&self) -> usize {
        self.len
    }

    /// Bytes held by the tree, counting each node at its padded size.
    #[must_use]
    pub fn footprint_bytes(&self) -> usize {
        self.arena().node_bytes() + StdMem::size_of::<Self>()
    }

    /// Key comparisons performed by inserts and lookups so far.
    #[must_use]
    #[inline]
    pub fn comparisons(&self) -> u64 {
        self.comparisons.load(AtomicOrdering::Relaxed)
    }
}
