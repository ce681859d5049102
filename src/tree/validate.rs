//! Structural self-check.
//!
//! [`BPlusTree::validate`] walks the whole tree and reports the first broken
//! invariant. It is meant for tests and debugging; it visits every node.

use crate::alloc::{InternodeId, LeafId, NodeRef};
use crate::key::{TreeKey, TreeValue};
use crate::tracing_helpers::warn_log;

use super::{BPlusTree, TreeError};

/// Bounds a subtree's keys must satisfy: `lower <= key < upper`.
#[derive(Clone, Copy)]
struct KeyRange<K> {
    lower: Option<K>,
    upper: Option<K>,
}

impl<K: TreeKey> KeyRange<K> {
    const UNBOUNDED: Self = Self {
        lower: None,
        upper: None,
    };

    fn contains(&self, key: K) -> bool {
        self.lower.is_none_or(|lo| key >= lo) && self.upper.is_none_or(|hi| key < hi)
    }
}

/// Totals gathered during the walk.
struct Walk {
    leaves_in_order: Vec<LeafId>,
    internodes_seen: usize,
    entries: usize,
}

fn violation(what: String) -> TreeError {
    warn_log!(%what, "tree validation failed");
    TreeError::InvariantViolation(what)
}

fn check_sorted<K: TreeKey>(keys: &[K]) -> bool {
    keys.windows(2).all(|pair| pair[0] < pair[1])
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Check every structural invariant.
    ///
    /// - keys inside each node strictly ascend
    /// - every key lies within the bounds set by its ancestors' separators
    /// - all leaves sit at depth [`levels`](Self::levels)
    /// - every internode's height matches its level
    /// - no node other than the root is empty
    /// - the sibling chain visits exactly the leaves, in key order
    /// - `len` and the arena's node counts match what the walk finds
    ///
    /// # Errors
    ///
    /// [`TreeError::InvariantViolation`] describing the first failure.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut walk = Walk {
            leaves_in_order: Vec::with_capacity(self.leaf_count()),
            internodes_seen: 0,
            entries: 0,
        };

        self.check_node(self.root(), 1, KeyRange::UNBOUNDED, &mut walk)?;
        self.check_leaf_chain(&walk.leaves_in_order)?;

        if walk.entries != self.len() {
            return Err(violation(format!(
                "len is {} but leaves hold {} entries",
                self.len(),
                walk.entries
            )));
        }

        if walk.leaves_in_order.len() != self.leaf_count() {
            return Err(violation(format!(
                "{} leaves reachable, {} allocated",
                walk.leaves_in_order.len(),
                self.leaf_count()
            )));
        }

        if walk.internodes_seen != self.internode_count() {
            return Err(violation(format!(
                "{} internodes reachable, {} allocated",
                walk.internodes_seen,
                self.internode_count()
            )));
        }

        Ok(())
    }

    fn check_node(
        &self,
        node: NodeRef,
        level: usize,
        range: KeyRange<K>,
        walk: &mut Walk,
    ) -> Result<(), TreeError> {
        match node {
            NodeRef::Leaf(id) => self.check_leaf(id, level, range, walk),
            NodeRef::Internode(id) => self.check_internode(id, level, range, walk),
        }
    }

    fn check_leaf(
        &self,
        id: LeafId,
        level: usize,
        range: KeyRange<K>,
        walk: &mut Walk,
    ) -> Result<(), TreeError> {
        let leaf = self.arena().leaf(id);
        let keys = leaf.keys();
        let is_root = level == 1;

        if level != self.levels() {
            return Err(violation(format!(
                "leaf {} at level {level}, expected {}",
                id.raw(),
                self.levels()
            )));
        }

        if keys.is_empty() && !is_root {
            return Err(violation(format!("non-root leaf {} is empty", id.raw())));
        }

        if !check_sorted(keys) {
            return Err(violation(format!("leaf {} keys not ascending", id.raw())));
        }

        if let Some(pos) = keys.iter().position(|&k| !range.contains(k)) {
            return Err(violation(format!(
                "leaf {} key at slot {pos} outside its parent's range",
                id.raw()
            )));
        }

        walk.leaves_in_order.push(id);
        walk.entries += keys.len();
        Ok(())
    }

    fn check_internode(
        &self,
        id: InternodeId,
        level: usize,
        range: KeyRange<K>,
        walk: &mut Walk,
    ) -> Result<(), TreeError> {
        let internode = self.arena().internode(id);
        let keys = internode.keys();

        let expected_height = self.levels().checked_sub(level + 1);
        if expected_height != Some(usize::from(internode.height())) {
            return Err(violation(format!(
                "internode {} at level {level} has height {}",
                id.raw(),
                internode.height()
            )));
        }

        if keys.is_empty() {
            return Err(violation(format!("internode {} has no separators", id.raw())));
        }

        if !check_sorted(keys) {
            return Err(violation(format!(
                "internode {} separators not ascending",
                id.raw()
            )));
        }

        if keys.iter().any(|&k| !range.contains(k)) {
            return Err(violation(format!(
                "internode {} separator outside its parent's range",
                id.raw()
            )));
        }

        walk.internodes_seen += 1;

        for (i, child) in internode.children().enumerate() {
            if child.is_leaf() != internode.children_are_leaves() {
                return Err(violation(format!(
                    "internode {} child {i} has the wrong kind",
                    id.raw()
                )));
            }

            let child_range = KeyRange {
                lower: if i == 0 { range.lower } else { Some(keys[i - 1]) },
                upper: keys.get(i).copied().or(range.upper),
            };
            self.check_node(child, level + 1, child_range, walk)?;
        }

        Ok(())
    }

    /// The sibling chain from the leftmost leaf must equal the in-order
    /// leaf sequence, ending in `None`.
    fn check_leaf_chain(&self, in_order: &[LeafId]) -> Result<(), TreeError> {
        let mut cursor = Some(self.leftmost_leaf());

        for (i, &expected) in in_order.iter().enumerate() {
            match cursor {
                Some(id) if id == expected => cursor = self.arena().leaf(id).next(),
                Some(id) => {
                    return Err(violation(format!(
                        "sibling chain step {i} reaches leaf {}, expected {}",
                        id.raw(),
                        expected.raw()
                    )));
                }
                None => {
                    return Err(violation(format!("sibling chain ends after {i} leaves")));
                }
            }
        }

        if let Some(id) = cursor {
            return Err(violation(format!(
                "sibling chain continues past the last leaf to {}",
                id.raw()
            )));
        }

        Ok(())
    }
}
