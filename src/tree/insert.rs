//! Insertion: descend to the target leaf, insert in sorted position, and
//! carry splits back up the call chain.

use crate::alloc::{NodeArena, NodeRef};
use crate::key::{TreeKey, TreeValue};
use crate::ksearch;
use crate::tracing_helpers::trace_log;

use super::split::{Split, absorb_split, split_leaf};
use super::{BPlusTree, TreeError};

/// What happened below a node during one insert.
#[derive(Debug)]
enum InsertOutcome<K, V> {
    /// Key existed; its previous value.
    Updated(V),

    /// New entry placed without splitting at this level.
    Inserted,

    /// New entry placed; this level split and the parent must absorb it.
    Split(Split<K>),
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Insert `key` with `value`.
    ///
    /// Returns the previous value if `key` was already present (the value is
    /// overwritten and the structure is untouched), `None` otherwise.
    ///
    /// # Errors
    ///
    /// [`TreeError::AllocationFailed`] if the nodes a worst-case split needs
    /// cannot be allocated. Space is reserved before anything is modified,
    /// so on error the tree is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TreeError> {
        self.arena.reserve_split_path(self.depth)?;

        let mut comparisons: u64 = 0;
        let outcome = insert_recursive(&mut self.arena, self.root, key, value, &mut comparisons);
        *self.comparisons.get_mut() += comparisons;

        trace_log!(comparisons, depth = self.depth, "insert");

        match outcome {
            InsertOutcome::Updated(old) => Ok(Some(old)),

            InsertOutcome::Inserted => {
                self.len += 1;
                Ok(None)
            }

            InsertOutcome::Split(split) => {
                self.grow_root(split);
                self.len += 1;
                Ok(None)
            }
        }
    }
}

impl<K: TreeKey, const WIDTH: usize> BPlusTree<K, K, WIDTH> {
    /// Insert `key` as both key and value (set-style use).
    ///
    /// Returns `true` if the key was not present before.
    ///
    /// # Errors
    ///
    /// See [`BPlusTree::insert`].
    pub fn insert_key(&mut self, key: K) -> Result<bool, TreeError> {
        Ok(self.insert(key, key)?.is_none())
    }
}

/// Insert into the subtree rooted at `node`.
///
/// Recursion depth equals tree depth, which is logarithmic in `len`.
fn insert_recursive<K: TreeKey, V: TreeValue, const WIDTH: usize>(
    arena: &mut NodeArena<K, V, WIDTH>,
    node: NodeRef,
    key: K,
    value: V,
    comparisons: &mut u64,
) -> InsertOutcome<K, V> {
    match node {
        NodeRef::Leaf(id) => {
            let leaf = arena.leaf_mut(id);
            let pos = ksearch::lower_bound(leaf.keys(), &key, comparisons);

            if pos.found {
                return InsertOutcome::Updated(leaf.replace_value(pos.i, value));
            }

            if leaf.is_full() {
                InsertOutcome::Split(split_leaf(arena, id, pos.i, key, value))
            } else {
                leaf.insert_at(pos.i, key, value);
                InsertOutcome::Inserted
            }
        }

        NodeRef::Internode(id) => {
            let parent = arena.internode(id);
            let pos = ksearch::upper_bound(parent.keys(), &key, comparisons);
            let child = parent.child(pos);

            match insert_recursive(arena, child, key, value, comparisons) {
                InsertOutcome::Split(split) => match absorb_split(arena, id, pos, split) {
                    Some(carried) => InsertOutcome::Split(carried),
                    None => InsertOutcome::Inserted,
                },
                other => other,
            }
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Fail fast in tests")]
mod tests {
    use super::*;

    #[test]
    fn test_insert_into_empty() {
        let mut tree: BPlusTree<u64, u64, 4> = BPlusTree::new();

        assert_eq!(tree.insert(7, 70).unwrap(), None);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(&7), Some(70));
    }

    #[test]
    fn test_duplicate_overwrites_and_returns_old() {
        let mut tree: BPlusTree<u64, u64, 4> = BPlusTree::new();
        for k in 0..20 {
            tree.insert(k, k).unwrap();
        }
        let nodes_before = tree.node_count();

        assert_eq!(tree.insert(13, 1300).unwrap(), Some(13));
        assert_eq!(tree.get(&13), Some(1300));
        assert_eq!(tree.len(), 20);
        assert_eq!(tree.node_count(), nodes_before);
    }

    #[test]
    fn test_first_leaf_split_grows_root() {
        let mut tree: BPlusTree<u64, u64, 4> = BPlusTree::new();
        for k in 1..=4 {
            tree.insert(k, k).unwrap();
        }
        assert_eq!(tree.levels(), 1);

        tree.insert(5, 5).unwrap();

        assert_eq!(tree.levels(), 2);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.internal_elements(), 1);
    }

    #[test]
    fn test_depth_grows_only_on_root_split() {
        let mut tree: BPlusTree<u64, u64, 3> = BPlusTree::new();
        let mut levels = tree.levels();
        let mut internodes = tree.internode_count();

        for k in 0..2_000u64 {
            tree.insert(k.wrapping_mul(0x9e37_79b9_7f4a_7c15), k).unwrap();

            let now = tree.levels();
            assert!(now == levels || now == levels + 1);
            if now > levels {
                assert!(tree.internode_count() > internodes);
            }
            levels = now;
            internodes = tree.internode_count();
        }
        tree.validate().unwrap();
    }

    #[test]
    fn test_insert_counts_comparisons() {
        let mut tree: BPlusTree<u64, u64, 4> = BPlusTree::new();

        tree.insert(1, 1).unwrap();
        assert_eq!(tree.comparisons(), 0);

        tree.insert(2, 2).unwrap();
        assert_eq!(tree.comparisons(), 1);
    }

    #[test]
    fn test_insert_key_set_semantics() {
        let mut tree: BPlusTree<u32, u32, 4> = BPlusTree::new();

        assert!(tree.insert_key(3).unwrap());
        assert!(!tree.insert_key(3).unwrap());
        assert_eq!(tree.get(&3), Some(3));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_failed_allocation_leaves_tree_unchanged() {
        let mut tree: BPlusTree<u64, u64, 4> = BPlusTree::new();
        tree.arena.set_node_limit(6);

        let mut failed_at = None;
        for k in 0..1_000u64 {
            let entries: Vec<(u64, u64)> = tree.iter().collect();
            let stats = tree.stats();

            match tree.insert(k, k * 10) {
                Ok(old) => assert!(old.is_none()),
                Err(err) => {
                    assert_eq!(err, TreeError::AllocationFailed);
                    assert_eq!(tree.iter().collect::<Vec<_>>(), entries);
                    assert_eq!(tree.stats(), stats);
                    assert!(tree.get(&k).is_none());
                    tree.validate().unwrap();
                    failed_at = Some(k);
                    break;
                }
            }
        }

        let k = failed_at.unwrap();
        assert_eq!(tree.len(), usize::try_from(k).unwrap());
        assert_eq!(tree.leaf_count(), 6);
    }

    #[test]
    fn test_descending_inserts_stay_valid() {
        let mut tree: BPlusTree<u64, u64, 2> = BPlusTree::new();
        for k in (0..500u64).rev() {
            tree.insert(k, k).unwrap();
        }

        tree.validate().unwrap();
        assert_eq!(tree.len(), 500);
        assert!(tree.keys().eq(0..500));
    }
}
