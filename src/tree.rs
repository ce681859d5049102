//! Filepath: src/tree.rs
//! [`BPlusTree`] - an in-memory B+tree tuned for bulk loading and parallel reads.
//!
//! # Phases
//!
//! A tree is built by sequential `insert` calls (`&mut self`), then queried
//! through `&self`: `find`, iteration, `sum`, `psum`, `par_find`. The borrow
//! checker enforces the phase split; nothing inside the tree locks.

use std::fmt as StdFmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::alloc::{LeafId, NodeArena, NodeRef};
use crate::key::{TreeKey, TreeValue};
use crate::leaf::LeafNode;

mod aggregate;
mod insert;
mod iter;
mod parallel;
mod split;
mod stats;
mod traverse;
mod validate;

pub use iter::{Iter, Keys, Values};
pub use parallel::ParFindResult;
pub use stats::TreeStats;

/// Node capacity used when `WIDTH` is not given.
///
/// With `u64` keys and values this makes a leaf exactly 4 cache lines and
/// an internode exactly 3.
pub const DEFAULT_WIDTH: usize = 15;

/// Smallest usable node capacity. A node must split into two non-empty halves.
pub const MIN_WIDTH: usize = 2;

/// Largest node capacity (slot counts are stored as `u16`).
pub const MAX_WIDTH: usize = u16::MAX as usize;

// ============================================================================
//  TreeError
// ============================================================================

/// Errors reported by the tree and its query pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Node capacity outside `MIN_WIDTH..=MAX_WIDTH`.
    InvalidWidth {
        /// The rejected capacity.
        width: usize,
    },

    /// Memory allocation failed while growing the tree.
    /// The tree is unchanged.
    AllocationFailed,

    /// A query pool was requested with zero workers.
    InvalidWorkerCount,

    /// The worker pool could not be started.
    PoolBuild(String),

    /// A structural invariant does not hold.
    InvariantViolation(String),
}

impl StdFmt::Display for TreeError {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::InvalidWidth { width } => {
                write!(
                    f,
                    "node width {width} outside supported range {MIN_WIDTH}..={MAX_WIDTH}"
                )
            }

            Self::AllocationFailed => write!(f, "memory allocation failed"),

            Self::InvalidWorkerCount => write!(f, "query pool needs at least one worker"),

            Self::PoolBuild(reason) => write!(f, "failed to start query pool: {reason}"),

            Self::InvariantViolation(what) => write!(f, "tree invariant violated: {what}"),
        }
    }
}

impl std::error::Error for TreeError {}

// ============================================================================
//  BPlusTree
// ============================================================================

/// An ordered map from `K` to `V`, stored as a B+tree of fixed-width nodes.
///
/// # Type Parameters
///
/// - `K` - Key type, see [`TreeKey`]
/// - `V` - Value type, see [`TreeValue`]
/// - `WIDTH` - Maximum entries per leaf and separators per internode
///
/// # Duplicate keys
///
/// Inserting a key that is already present overwrites its value and returns
/// the previous one. The structure is not changed.
///
/// # Example
///
/// ```rust
/// use bptree::BPlusTree;
///
/// let mut tree: BPlusTree<u64, u64> = BPlusTree::new();
/// for k in 1..1000 {
///     tree.insert(k, k * 2).unwrap();
/// }
///
/// assert_eq!(tree.get(&500), Some(1000));
/// assert_eq!(tree.sum(), 499_500);
/// ```
pub struct BPlusTree<K, V, const WIDTH: usize = DEFAULT_WIDTH> {
    /// Owner of every node.
    arena: NodeArena<K, V, WIDTH>,

    /// Root node. Starts as an empty leaf.
    root: NodeRef,

    /// Number of levels, root to leaves inclusive (1 for a lone leaf).
    depth: usize,

    /// Number of entries.
    len: usize,

    /// Key comparisons performed by inserts and lookups so far.
    /// Relaxed: it is a statistic, not a synchronization point.
    comparisons: AtomicU64,
}

impl<K, V, const WIDTH: usize> StdFmt::Debug for BPlusTree<K, V, WIDTH> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("BPlusTree")
            .field("len", &self.len)
            .field("depth", &self.depth)
            .field("width", &WIDTH)
            .field("arena", &self.arena)
            .finish_non_exhaustive()
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Rejects unusable widths at compile time.
    const WIDTH_CHECK: () = {
        assert!(WIDTH >= MIN_WIDTH, "WIDTH must be at least 2");
        assert!(WIDTH <= MAX_WIDTH, "WIDTH must fit in u16");
    };

    /// Create an empty tree: a single empty leaf, one level.
    #[must_use]
    pub fn new() -> Self {
        let _: () = Self::WIDTH_CHECK;
        Self::empty()
    }

    /// Create an empty tree, validating `WIDTH` at run time.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidWidth`] if `WIDTH` is below [`MIN_WIDTH`] or
    /// above [`MAX_WIDTH`].
    pub fn try_new() -> Result<Self, TreeError> {
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&WIDTH) {
            return Err(TreeError::InvalidWidth { width: WIDTH });
        }
        Ok(Self::empty())
    }

    fn empty() -> Self {
        let mut arena = NodeArena::new();
        let root = arena.alloc_leaf(LeafNode::new());

        Self {
            arena,
            root: NodeRef::Leaf(root),
            depth: 1,
            len: 0,
            comparisons: AtomicU64::new(0),
        }
    }

    /// Number of entries.
    #[must_use]
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if the tree has no entries.
    #[must_use]
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Node capacity.
    #[must_use]
    #[inline(always)]
    pub const fn width(&self) -> usize {
        WIDTH
    }

    /// Current root.
    #[must_use]
    #[inline(always)]
    pub(crate) const fn root(&self) -> NodeRef {
        self.root
    }

    /// Node storage.
    #[must_use]
    #[inline(always)]
    pub(crate) const fn arena(&self) -> &NodeArena<K, V, WIDTH> {
        &self.arena
    }

    /// Leftmost leaf, reached by following child 0 from the root.
    pub(crate) fn leftmost_leaf(&self) -> LeafId {
        let mut node = self.root;
        loop {
            match node {
                NodeRef::Leaf(id) => return id,
                NodeRef::Internode(id) => node = self.arena.internode(id).child(0),
            }
        }
    }

    /// Add a finished operation's comparisons to the running total.
    #[inline(always)]
    pub(crate) fn record_comparisons(&self, count: u64) {
        self.comparisons.fetch_add(count, AtomicOrdering::Relaxed);
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> Default for BPlusTree<K, V, WIDTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> Extend<(K, V)> for BPlusTree<K, V, WIDTH> {
    /// # Panics
    ///
    /// Panics if allocation fails, like the standard collections.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            if let Err(err) = self.insert(key, value) {
                panic!("BPlusTree::extend: {err}");
            }
        }
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> FromIterator<(K, V)>
    for BPlusTree<K, V, WIDTH>
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

// ============================================================================
//  Tests
// ============================================================================

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Fail fast in tests")]
mod tests {
    use super::*;

    fn _assert_send_sync()
    where
        BPlusTree<u64, u64>: Send + Sync,
    {
    }

    #[test]
    fn test_new_tree_is_empty() {
        let tree: BPlusTree<u64, u64> = BPlusTree::new();

        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.width(), DEFAULT_WIDTH);
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_try_new_rejects_width_one() {
        let err = BPlusTree::<u64, u64, 1>::try_new().unwrap_err();

        assert_eq!(err, TreeError::InvalidWidth { width: 1 });
        assert!(err.to_string().contains("width 1"));
    }

    #[test]
    fn test_try_new_accepts_min_width() {
        let tree = BPlusTree::<u64, u64, MIN_WIDTH>::try_new().unwrap();

        assert!(tree.is_empty());
    }

    #[test]
    fn test_default_matches_new() {
        let tree: BPlusTree<u32, u32, 8> = BPlusTree::default();

        assert!(tree.is_empty());
        assert_eq!(tree.width(), 8);
    }

    #[test]
    fn test_from_iter() {
        let tree: BPlusTree<u64, u64, 4> = (0..50u64).rev().map(|k| (k, k + 1)).collect();

        assert_eq!(tree.len(), 50);
        assert_eq!(tree.get(&0), Some(1));
        assert_eq!(tree.get(&49), Some(50));
    }

    #[test]
    fn test_extend_overwrites_duplicates() {
        let mut tree: BPlusTree<u64, u64, 4> = BPlusTree::new();
        tree.extend([(1, 10), (2, 20), (1, 11)]);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(&1), Some(11));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(TreeError::AllocationFailed.to_string(), "memory allocation failed");
        assert_eq!(
            TreeError::InvariantViolation("leaf 3 unsorted".into()).to_string(),
            "tree invariant violated: leaf 3 unsorted"
        );
    }

    #[test]
    fn test_debug_output() {
        let tree: BPlusTree<u64, u64> = BPlusTree::new();
        let debug = format!("{tree:?}");

        assert!(debug.contains("BPlusTree"));
        assert!(debug.contains("depth: 1"));
    }
}
