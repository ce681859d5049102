//! Point lookup: root-to-leaf descent.

use crate::alloc::{LeafId, NodeRef};
use crate::key::{TreeKey, TreeValue};
use crate::ksearch;

use super::BPlusTree;

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Look up `key`, returning a reference to its value.
    ///
    /// Read-only; safe to call from many threads at once.
    #[must_use]
    #[inline]
    pub fn find(&self, key: &K) -> Option<&V> {
        let mut comparisons: u64 = 0;
        let found = self.find_counted(key, &mut comparisons);
        self.record_comparisons(comparisons);
        found
    }

    /// Look up `key`, returning a copy of its value.
    #[must_use]
    #[inline]
    pub fn get(&self, key: &K) -> Option<V> {
        self.find(key).copied()
    }

    /// Check if `key` is present.
    #[must_use]
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// [`find`](Self::find) that adds its comparisons to a caller-owned
    /// counter instead of the shared one.
    #[inline]
    pub(crate) fn find_counted(&self, key: &K, comparisons: &mut u64) -> Option<&V> {
        let leaf = self.arena().leaf(self.descend(key, comparisons));
        let pos = ksearch::lower_bound(leaf.keys(), key, comparisons);

        pos.try_slot().map(|i| leaf.value(i))
    }

    /// Follow separators from the root to the leaf that would hold `key`.
    #[inline]
    fn descend(&self, key: &K, comparisons: &mut u64) -> LeafId {
        let mut node = self.root();
        loop {
            match node {
                NodeRef::Leaf(id) => return id,

                NodeRef::Internode(id) => {
                    let internode = self.arena().internode(id);
                    let pos = ksearch::upper_bound(internode.keys(), key, comparisons);
                    node = internode.child(pos);
                }
            }
        }
    }
}
