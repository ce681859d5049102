//! Leaf node for [`BPlusTree`](crate::BPlusTree).
//!
//! Leaves hold the entries. Keys and values are stored in two parallel
//! arrays so a search touches only the key array.
//!
//! # Memory Layout (`K = V = u64`, WIDTH=15)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Header (16 bytes)                                               │
//! │   nkeys: u16                                                    │
//! │   next: Option<LeafId> (sibling link, non-owning)               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   keys: [u64; 15] (120 bytes)                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   values: [u64; 15] (120 bytes)                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! Total: 256 bytes (4 cache lines)
//! ```

use std::cmp::Ordering;
use std::fmt as StdFmt;

use crate::alloc::LeafId;

/// A leaf of the tree.
///
/// # Invariants
/// - `nkeys <= WIDTH`
/// - `keys[0..nkeys]` is strictly increasing
/// - `values[i]` belongs to `keys[i]`
/// - `next` is the leaf holding the next larger keys, or `None` for the
///   rightmost leaf. It is used only for ordered traversal.
/// - Only the root leaf of an empty tree has `nkeys == 0`.
#[repr(C, align(64))]
pub struct LeafNode<K, V, const WIDTH: usize> {
    /// Number of occupied slots.
    nkeys: u16,

    /// Right sibling.
    next: Option<LeafId>,

    /// Keys, sorted in `0..nkeys`. Slots past `nkeys` are stale.
    keys: [K; WIDTH],

    /// Values, parallel to `keys`.
    values: [V; WIDTH],
}

impl<K, V, const WIDTH: usize> StdFmt::Debug for LeafNode<K, V, WIDTH> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("LeafNode")
            .field("nkeys", &self.nkeys)
            .field("next", &self.next)
            .field("width", &WIDTH)
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Default, V: Copy + Default, const WIDTH: usize> Default for LeafNode<K, V, WIDTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Default, V: Copy + Default, const WIDTH: usize> LeafNode<K, V, WIDTH> {
    /// Create an empty leaf with no sibling.
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self {
            nkeys: 0,
            next: None,
            keys: [K::default(); WIDTH],
            values: [V::default(); WIDTH],
        }
    }
}

impl<K: Copy, V: Copy, const WIDTH: usize> LeafNode<K, V, WIDTH> {
    // ========================================================================
    //  Accessors
    // ========================================================================

    /// Number of entries.
    #[must_use]
    #[inline(always)]
    pub const fn nkeys(&self) -> usize {
        self.nkeys as usize
    }

    /// Check if the leaf holds no entries.
    #[must_use]
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.nkeys == 0
    }

    /// Check if another insert would need a split.
    #[must_use]
    #[inline(always)]
    pub const fn is_full(&self) -> bool {
        self.nkeys() >= WIDTH
    }

    /// Occupied keys, ascending.
    #[must_use]
    #[inline(always)]
    pub fn keys(&self) -> &[K] {
        &self.keys[..self.nkeys()]
    }

    /// Occupied values, in key order.
    #[must_use]
    #[inline(always)]
    pub fn values(&self) -> &[V] {
        &self.values[..self.nkeys()]
    }

    /// Key at position `i`.
    #[must_use]
    #[inline(always)]
    pub fn key(&self, i: usize) -> K {
        debug_assert!(i < self.nkeys());
        self.keys[i]
    }

    /// Value at position `i`.
    #[must_use]
    #[inline(always)]
    pub fn value(&self, i: usize) -> &V {
        debug_assert!(i < self.nkeys());
        &self.values[i]
    }

    /// Smallest key, `None` when empty.
    #[must_use]
    #[inline]
    pub fn first_key(&self) -> Option<K> {
        self.keys().first().copied()
    }

    /// Right sibling.
    #[must_use]
    #[inline(always)]
    pub const fn next(&self) -> Option<LeafId> {
        self.next
    }

    /// Relink the right sibling.
    #[inline(always)]
    pub const fn set_next(&mut self, next: Option<LeafId>) {
        self.next = next;
    }

    // ========================================================================
    //  Mutation
    // ========================================================================

    /// Overwrite the value at `i`, returning the previous one.
    #[inline]
    pub fn replace_value(&mut self, i: usize, value: V) -> V {
        debug_assert!(i < self.nkeys());
        std::mem::replace(&mut self.values[i], value)
    }

    /// Insert an entry at position `pos`, shifting larger entries right.
    ///
    /// The leaf must not be full, and `pos` must be the insertion point
    /// returned by a lower-bound search for `key`.
    #[inline]
    #[allow(clippy::cast_possible_truncation, reason = "nkeys <= WIDTH <= u16::MAX")]
    pub fn insert_at(&mut self, pos: usize, key: K, value: V)
    where
        K: Ord,
    {
        let n = self.nkeys();
        debug_assert!(n < WIDTH, "insert_at on a full leaf");
        debug_assert!(pos <= n);
        debug_assert!(pos == 0 || self.keys[pos - 1] < key, "leaf order violated");
        debug_assert!(pos == n || key < self.keys[pos], "leaf order violated");

        self.keys.copy_within(pos..n, pos + 1);
        self.values.copy_within(pos..n, pos + 1);
        self.keys[pos] = key;
        self.values[pos] = value;
        self.nkeys = (n + 1) as u16;
    }

    /// Split a full leaf while inserting `(key, value)` at `pos`.
    ///
    /// The `WIDTH + 1` entries (existing plus new) are divided at
    /// `mid = (WIDTH + 1) / 2`: this leaf keeps the first `mid`, the returned
    /// leaf takes the rest. The returned leaf inherits this leaf's sibling;
    /// the caller links this leaf to it once it has a handle.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, reason = "nkeys <= WIDTH <= u16::MAX")]
    pub fn split_insert(&mut self, pos: usize, key: K, value: V) -> Self
    where
        K: Ord + Default,
        V: Default,
    {
        debug_assert!(self.is_full(), "split_insert on a leaf with room");
        debug_assert!(pos <= WIDTH);

        let total = WIDTH + 1;
        let mid = total / 2;

        let mut right = Self::new();
        for (j, idx) in (mid..total).enumerate() {
            let (k, v) = self.logical_entry(idx, pos, key, value);
            right.keys[j] = k;
            right.values[j] = v;
        }
        right.nkeys = (total - mid) as u16;
        right.next = self.next;

        if pos < mid {
            self.keys.copy_within(pos..mid - 1, pos + 1);
            self.values.copy_within(pos..mid - 1, pos + 1);
            self.keys[pos] = key;
            self.values[pos] = value;
        }
        self.nkeys = mid as u16;

        right
    }

    /// Entry `idx` of the sequence "current entries with `(key, value)`
    /// inserted at `pos`".
    #[inline(always)]
    fn logical_entry(&self, idx: usize, pos: usize, key: K, value: V) -> (K, V) {
        match idx.cmp(&pos) {
            Ordering::Less => (self.keys[idx], self.values[idx]),
            Ordering::Equal => (key, value),
            Ordering::Greater => (self.keys[idx - 1], self.values[idx - 1]),
        }
    }
}
