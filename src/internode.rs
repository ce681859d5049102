//! Internode (internal node) for [`BPlusTree`](crate::BPlusTree).
//!
//! Internodes route descents. They hold separator keys and child handles,
//! no values, so with the same `WIDTH` an internode is smaller than a leaf.
//!
//! # Memory Layout (`K = u64`, WIDTH=15)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   nkeys: u16, height: u16, tail_child: u32 (8 bytes)            │
//! │   keys: [u64; 15] (120 bytes) - separators                      │
//! │   children: [u32; 15] (60 bytes) - child handles 0..15          │
//! │   padding                                                       │
//! └─────────────────────────────────────────────────────────────────┘
//! Total: 192 bytes (3 cache lines)
//! ```
//!
//! # B+Tree Routing Model
//!
//! ```text
//!         [K0 | K1 | K2]           <- Internode (3 keys, 4 children)
//!        /    |    |    \
//!    C0     C1    C2     C3        <- Children
//!
//!    C0: keys < K0
//!    C1: keys >= K0 and < K1
//!    C2: keys >= K1 and < K2
//!    C3: keys >= K2
//! ```

use std::fmt as StdFmt;

use crate::alloc::{InternodeId, LeafId, NodeRef};

// ============================================================================
//  InternodeNode
// ============================================================================

/// An internal routing node.
///
/// Stores up to WIDTH separators and WIDTH+1 children. Child handles are raw
/// `u32`s; whether they name leaves or internodes follows from `height`,
/// since every leaf sits at the same depth.
///
/// # Invariants
/// - `1 <= nkeys <= WIDTH` once linked into a tree
/// - For `nkeys` keys, children `0..=nkeys` are valid
/// - Keys are strictly ascending
/// - `child(i)` contains keys `< keys[i]`
/// - `child(i + 1)` contains keys `>= keys[i]`
#[repr(C, align(64))]
pub struct InternodeNode<K, const WIDTH: usize> {
    /// Number of separators (0 to WIDTH).
    nkeys: u16,

    /// Height above the leaves (0 = children are leaves).
    height: u16,

    /// Child slot `WIDTH`.
    /// Kept outside `children` because `[u32; WIDTH + 1]` needs the unstable
    /// `generic_const_exprs`.
    tail_child: u32,

    /// Separators, sorted in `0..nkeys`.
    keys: [K; WIDTH],

    /// Child slots `0..WIDTH`.
    children: [u32; WIDTH],
}

impl<K, const WIDTH: usize> StdFmt::Debug for InternodeNode<K, WIDTH> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("InternodeNode")
            .field("nkeys", &self.nkeys)
            .field("height", &self.height)
            .field("width", &WIDTH)
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Default, const WIDTH: usize> InternodeNode<K, WIDTH> {
    /// Create an internode with no separators at the given height.
    #[must_use]
    #[inline]
    pub fn new(height: u16) -> Self {
        Self {
            nkeys: 0,
            height,
            tail_child: 0,
            keys: [K::default(); WIDTH],
            children: [0; WIDTH],
        }
    }

    /// Create a root over two children split apart by `separator`.
    #[must_use]
    pub fn new_root(height: u16, left: NodeRef, separator: K, right: NodeRef) -> Self {
        let mut node = Self::new(height);
        node.keys[0] = separator;
        node.set_child_raw(0, left.raw());
        node.set_child_raw(1, right.raw());
        node.nkeys = 1;
        node
    }
}

impl<K: Copy, const WIDTH: usize> InternodeNode<K, WIDTH> {
    // ========================================================================
    //  Accessors
    // ========================================================================

    /// Number of separators.
    #[must_use]
    #[inline(always)]
    pub const fn nkeys(&self) -> usize {
        self.nkeys as usize
    }

    /// Number of children (`nkeys + 1`).
    #[must_use]
    #[inline(always)]
    pub const fn nchildren(&self) -> usize {
        self.nkeys() + 1
    }

    /// Check if another separator would need a split.
    #[must_use]
    #[inline(always)]
    pub const fn is_full(&self) -> bool {
        self.nkeys() >= WIDTH
    }

    /// Height above the leaves.
    #[must_use]
    #[inline(always)]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Check if children are leaves.
    #[must_use]
    #[inline(always)]
    pub const fn children_are_leaves(&self) -> bool {
        self.height == 0
    }

    /// Occupied separators, ascending.
    #[must_use]
    #[inline(always)]
    pub fn keys(&self) -> &[K] {
        &self.keys[..self.nkeys()]
    }

    /// Child at `i` (`0..=nkeys`), tagged by kind.
    #[must_use]
    #[inline(always)]
    pub fn child(&self, i: usize) -> NodeRef {
        debug_assert!(i <= self.nkeys());
        let raw = self.child_raw(i);
        if self.children_are_leaves() {
            NodeRef::Leaf(LeafId::from_raw(raw))
        } else {
            NodeRef::Internode(InternodeId::from_raw(raw))
        }
    }

    /// All children in key order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef> + '_ {
        (0..self.nchildren()).map(|i| self.child(i))
    }

    #[inline(always)]
    fn child_raw(&self, i: usize) -> u32 {
        if i < WIDTH {
            self.children[i]
        } else {
            self.tail_child
        }
    }

    #[inline(always)]
    fn set_child_raw(&mut self, i: usize, raw: u32) {
        if i < WIDTH {
            self.children[i] = raw;
        } else {
            self.tail_child = raw;
        }
    }

    // ========================================================================
    //  Mutation
    // ========================================================================

    /// Insert `separator` at `pos` with `right` as the child just after it.
    ///
    /// Used after `child(pos)` split: the new sibling holds keys
    /// `>= separator`. The node must not be full.
    #[allow(clippy::cast_possible_truncation, reason = "nkeys <= WIDTH <= u16::MAX")]
    pub fn insert_at(&mut self, pos: usize, separator: K, right: NodeRef)
    where
        K: Ord,
    {
        let n = self.nkeys();
        debug_assert!(n < WIDTH, "insert_at on a full internode");
        debug_assert!(pos <= n);
        debug_assert!(pos == 0 || self.keys[pos - 1] < separator, "separator order violated");
        debug_assert!(pos == n || separator < self.keys[pos], "separator order violated");

        self.keys.copy_within(pos..n, pos + 1);
        for i in (pos + 2..=n + 1).rev() {
            self.set_child_raw(i, self.child_raw(i - 1));
        }
        self.keys[pos] = separator;
        self.set_child_raw(pos + 1, right.raw());
        self.nkeys = (n + 1) as u16;
    }

    /// Split a full internode while inserting `(separator, right)` at `pos`.
    ///
    /// Of the `WIDTH + 1` separators, the one at `mid = (WIDTH + 1) / 2` is
    /// promoted and returned; this node keeps separators `0..mid` with their
    /// `mid + 1` children, and the returned node takes the rest.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, reason = "nkeys <= WIDTH <= u16::MAX")]
    pub fn split_insert(&mut self, pos: usize, separator: K, right: NodeRef) -> (K, Self)
    where
        K: Ord + Default,
    {
        debug_assert!(self.is_full(), "split_insert on an internode with room");
        debug_assert!(pos <= WIDTH);

        let total = WIDTH + 1;
        let mid = total / 2;
        let right_raw = right.raw();
        let promoted = self.logical_key(mid, pos, separator);

        let mut sibling = Self::new(self.height);
        for (j, idx) in (mid + 1..total).enumerate() {
            sibling.keys[j] = self.logical_key(idx, pos, separator);
        }
        for (j, idx) in (mid + 1..=total).enumerate() {
            sibling.set_child_raw(j, self.logical_child(idx, pos, right_raw));
        }
        sibling.nkeys = (total - mid - 1) as u16;

        // Rewrite the left half top-down so each read sees an unshifted slot.
        for idx in (pos..mid).rev() {
            let key = self.logical_key(idx, pos, separator);
            self.keys[idx] = key;
        }
        for idx in (pos + 1..=mid).rev() {
            let raw = self.logical_child(idx, pos, right_raw);
            self.set_child_raw(idx, raw);
        }
        self.nkeys = mid as u16;

        (promoted, sibling)
    }

    /// Separator `idx` with `separator` inserted at `pos`.
    #[inline(always)]
    fn logical_key(&self, idx: usize, pos: usize, separator: K) -> K {
        if idx < pos {
            self.keys[idx]
        } else if idx == pos {
            separator
        } else {
            self.keys[idx - 1]
        }
    }

    /// Child `idx` with `right` inserted at `pos + 1`.
    #[inline(always)]
    fn logical_child(&self, idx: usize, pos: usize, right: u32) -> u32 {
        if idx <= pos {
            self.child_raw(idx)
        } else if idx == pos + 1 {
            right
        } else {
            self.child_raw(idx - 1)
        }
    }
}
