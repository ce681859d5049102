//! Key search within a single node.
//!
//! - [`lower_bound`] locates a key (or its insertion point) in a leaf.
//! - [`upper_bound`] picks the child to follow in an internode.
//!
//! Every three-way key comparison is added to the caller's counter so the
//! tree can report comparison totals per operation. Small nodes are scanned
//! linearly (sequential, branch-predictable, one cache line at a time);
//! nodes wider than [`LINEAR_SEARCH_MAX`] use binary search.

use std::cmp::Ordering;

/// Widest node that is scanned linearly.
pub const LINEAR_SEARCH_MAX: usize = 16;

// ============================================================================
//  KeyIndexPosition
// ============================================================================

/// Result of a leaf search.
///
/// `i` is the position of the key when `found`, otherwise the position at
/// which it would be inserted to keep the node sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyIndexPosition {
    /// Logical position in sorted order.
    pub i: usize,

    /// Whether the key at `i` equals the search key.
    pub found: bool,
}

impl KeyIndexPosition {
    /// Position of an existing key.
    #[must_use]
    #[inline(always)]
    pub const fn found(i: usize) -> Self {
        Self { i, found: true }
    }

    /// Insertion point for an absent key.
    #[must_use]
    #[inline(always)]
    pub const fn not_found(i: usize) -> Self {
        Self { i, found: false }
    }

    /// Position as an `Option`, `None` when the key is absent.
    #[must_use]
    #[inline(always)]
    pub const fn try_slot(&self) -> Option<usize> {
        if self.found { Some(self.i) } else { None }
    }
}

// ============================================================================
//  Entry Points
// ============================================================================

/// Lower bound of `key` in the sorted slice `keys`.
#[inline]
pub fn lower_bound<K: Ord>(keys: &[K], key: &K, comparisons: &mut u64) -> KeyIndexPosition {
    if keys.len() <= LINEAR_SEARCH_MAX {
        lower_bound_linear(keys, key, comparisons)
    } else {
        lower_bound_binary(keys, key, comparisons)
    }
}

/// Index of the first separator strictly greater than `key`, or `keys.len()`.
///
/// A key equal to a separator routes to the right of it, matching the
/// internode invariant `child[i + 1]` holds keys `>= keys[i]`.
#[inline]
pub fn upper_bound<K: Ord>(keys: &[K], key: &K, comparisons: &mut u64) -> usize {
    if keys.len() <= LINEAR_SEARCH_MAX {
        upper_bound_linear(keys, key, comparisons)
    } else {
        upper_bound_binary(keys, key, comparisons)
    }
}

// ============================================================================
//  Linear Search
// ============================================================================

/// Linear lower bound.
#[inline]
pub fn lower_bound_linear<K: Ord>(keys: &[K], key: &K, comparisons: &mut u64) -> KeyIndexPosition {
    for (i, slot) in keys.iter().enumerate() {
        *comparisons += 1;
        match key.cmp(slot) {
            Ordering::Less => return KeyIndexPosition::not_found(i),
            Ordering::Equal => return KeyIndexPosition::found(i),
            Ordering::Greater => {}
        }
    }

    KeyIndexPosition::not_found(keys.len())
}

/// Linear upper bound.
#[inline]
pub fn upper_bound_linear<K: Ord>(keys: &[K], key: &K, comparisons: &mut u64) -> usize {
    for (i, slot) in keys.iter().enumerate() {
        *comparisons += 1;
        if key < slot {
            return i;
        }
    }

    keys.len()
}

// ============================================================================
//  Binary Search
// ============================================================================

/// Binary lower bound.
#[inline]
pub fn lower_bound_binary<K: Ord>(keys: &[K], key: &K, comparisons: &mut u64) -> KeyIndexPosition {
    let mut l: usize = 0;
    let mut r: usize = keys.len();

    while l < r {
        let m: usize = (l + r) >> 1;
        *comparisons += 1;

        match key.cmp(&keys[m]) {
            Ordering::Less => r = m,
            Ordering::Equal => return KeyIndexPosition::found(m),
            Ordering::Greater => l = m + 1,
        }
    }

    KeyIndexPosition::not_found(l)
}

/// Binary upper bound.
#[inline]
pub fn upper_bound_binary<K: Ord>(keys: &[K], key: &K, comparisons: &mut u64) -> usize {
    let mut l: usize = 0;
    let mut r: usize = keys.len();

    while l < r {
        let m: usize = (l + r) >> 1;
        *comparisons += 1;

        if key < &keys[m] {
            r = m;
        } else {
            l = m + 1;
        }
    }

    l
}
