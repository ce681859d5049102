//! Ordered forward iteration over the leaf chain.
//!
//! An [`Iter`] is a `(leaf, index)` cursor. It starts at the leftmost leaf
//! and follows sibling links, so after positioning it never revisits an
//! internode. Iteration is one-shot; call [`BPlusTree::iter`] again to
//! start over.

use std::fmt as StdFmt;
use std::iter::FusedIterator;

use crate::alloc::{LeafId, NodeArena};
use crate::key::{TreeKey, TreeValue};

use super::BPlusTree;

/// Cursor over all entries in ascending key order.
///
/// Besides [`Iterator`], the cursor protocol is available directly:
///
/// ```rust
/// use bptree::BPlusTree;
///
/// let tree: BPlusTree<u32, u32> = (1..=3).map(|k| (k, k)).collect();
/// let mut it = tree.iter();
/// let mut seen = Vec::new();
/// while !it.is_done() {
///     seen.push(it.current().map(|(k, _)| k));
///     it.advance();
/// }
/// assert_eq!(seen, [Some(1), Some(2), Some(3)]);
/// ```
pub struct Iter<'a, K, V, const WIDTH: usize> {
    arena: &'a NodeArena<K, V, WIDTH>,

    /// Current leaf, `None` once past the last entry.
    leaf: Option<LeafId>,

    /// Position within `leaf`.
    index: usize,

    /// Entries not yet yielded.
    remaining: usize,
}

impl<K, V, const WIDTH: usize> StdFmt::Debug for Iter<'_, K, V, WIDTH> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("Iter")
            .field("leaf", &self.leaf)
            .field("index", &self.index)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> Clone for Iter<'_, K, V, WIDTH> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            leaf: self.leaf,
            index: self.index,
            remaining: self.remaining,
        }
    }
}

impl<'a, K: TreeKey, V: TreeValue, const WIDTH: usize> Iter<'a, K, V, WIDTH> {
    fn begin(tree: &'a BPlusTree<K, V, WIDTH>) -> Self {
        let first = tree.leftmost_leaf();
        // Only the root of an empty tree is an empty leaf.
        let leaf = (!tree.arena().leaf(first).is_empty()).then_some(first);

        Self {
            arena: tree.arena(),
            leaf,
            index: 0,
            remaining: tree.len(),
        }
    }

    /// Check if every entry has been visited.
    #[must_use]
    #[inline(always)]
    pub const fn is_done(&self) -> bool {
        self.leaf.is_none()
    }

    /// Entry under the cursor, `None` when done.
    #[must_use]
    #[inline]
    pub fn current(&self) -> Option<(K, V)> {
        let leaf = self.arena.leaf(self.leaf?);
        Some((leaf.key(self.index), *leaf.value(self.index)))
    }

    /// Step to the next entry, crossing to the sibling leaf at the end of
    /// the current one. No-op when done.
    #[inline]
    pub fn advance(&mut self) {
        let Some(id) = self.leaf else {
            return;
        };

        let leaf = self.arena.leaf(id);
        self.index += 1;
        self.remaining -= 1;
        if self.index >= leaf.nkeys() {
            self.leaf = leaf.next();
            self.index = 0;
        }
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> Iterator for Iter<'_, K, V, WIDTH> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.current()?;
        self.advance();
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> ExactSizeIterator for Iter<'_, K, V, WIDTH> {}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> FusedIterator for Iter<'_, K, V, WIDTH> {}

/// Keys in ascending order.
#[derive(Debug, Clone)]
pub struct Keys<'a, K: TreeKey, V: TreeValue, const WIDTH: usize> {
    inner: Iter<'a, K, V, WIDTH>,
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> Iterator for Keys<'_, K, V, WIDTH> {
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> ExactSizeIterator for Keys<'_, K, V, WIDTH> {}

/// Values in key order.
#[derive(Debug, Clone)]
pub struct Values<'a, K: TreeKey, V: TreeValue, const WIDTH: usize> {
    inner: Iter<'a, K, V, WIDTH>,
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> Iterator for Values<'_, K, V, WIDTH> {
    type Item = V;

    #[inline]
    fn next(&mut self) -> Option<V> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> ExactSizeIterator for Values<'_, K, V, WIDTH> {}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Iterate over `(key, value)` pairs in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, WIDTH> {
        Iter::begin(self)
    }

    /// Iterate over keys in ascending order.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, WIDTH> {
        Keys { inner: self.iter() }
    }

    /// Iterate over values in key order.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V, WIDTH> {
        Values { inner: self.iter() }
    }
}

impl<'a, K: TreeKey, V: TreeValue, const WIDTH: usize> IntoIterator for &'a BPlusTree<K, V, WIDTH> {
    type Item = (K, V);
    type IntoIter = Iter<'a, K, V, WIDTH>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
