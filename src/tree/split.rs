//! Node splits and root growth.
//!
//! A split happens only when an insert reaches a full node. The full node
//! keeps the lower half, a freshly allocated sibling takes the upper half,
//! and a separator travels one level up through the insert call chain.
//! Nodes store no parent pointers.

use crate::alloc::{InternodeId, LeafId, NodeArena, NodeRef};
use crate::internode::InternodeNode;
use crate::key::{TreeKey, TreeValue};
use crate::tracing_helpers::debug_log;

use super::BPlusTree;

/// A split that the parent still has to absorb.
#[derive(Debug, Clone, Copy)]
pub(super) struct Split<K> {
    /// Smallest key reachable through `right`.
    pub separator: K,

    /// The new upper-half sibling.
    pub right: NodeRef,
}

/// Split full leaf `id` while inserting `(key, value)` at `pos`.
///
/// The new leaf is linked in as `id`'s right sibling. The separator is its
/// smallest key.
pub(super) fn split_leaf<K: TreeKey, V: TreeValue, const WIDTH: usize>(
    arena: &mut NodeArena<K, V, WIDTH>,
    id: LeafId,
    pos: usize,
    key: K,
    value: V,
) -> Split<K> {
    let right = arena.leaf_mut(id).split_insert(pos, key, value);
    let separator = right.key(0);
    let right_id = arena.alloc_leaf(right);
    arena.leaf_mut(id).set_next(Some(right_id));

    debug_log!(left = id.raw(), right = right_id.raw(), "leaf split");

    Split {
        separator,
        right: NodeRef::Leaf(right_id),
    }
}

/// Split full internode `id` while absorbing a child split at `pos`.
///
/// The separator handed further up is the promoted middle key, which is
/// removed from both halves.
pub(super) fn split_internode<K: TreeKey, V: TreeValue, const WIDTH: usize>(
    arena: &mut NodeArena<K, V, WIDTH>,
    id: InternodeId,
    pos: usize,
    child_split: Split<K>,
) -> Split<K> {
    let (separator, sibling) = arena.internode_mut(id).split_insert(
        pos,
        child_split.separator,
        child_split.right,
    );
    let right_id = arena.alloc_internode(sibling);

    debug_log!(
        left = id.raw(),
        right = right_id.raw(),
        height = arena.internode(id).height(),
        "internode split"
    );

    Split {
        separator,
        right: NodeRef::Internode(right_id),
    }
}

/// Let internode `id` absorb a child split at `pos`, splitting it if full.
///
/// Returns the split to propagate, if any.
pub(super) fn absorb_split<K: TreeKey, V: TreeValue, const WIDTH: usize>(
    arena: &mut NodeArena<K, V, WIDTH>,
    id: InternodeId,
    pos: usize,
    child_split: Split<K>,
) -> Option<Split<K>> {
    let node = arena.internode_mut(id);
    if node.is_full() {
        Some(split_internode(arena, id, pos, child_split))
    } else {
        node.insert_at(pos, child_split.separator, child_split.right);
        None
    }
}

impl<K: TreeKey, V: TreeValue, const WIDTH: usize> BPlusTree<K, V, WIDTH> {
    /// Put a new root above the old one and the split-off sibling.
    ///
    /// This is the only place the tree gains a level.
    #[allow(clippy::cast_possible_truncation, reason = "depth is logarithmic in len")]
    pub(super) fn grow_root(&mut self, split: Split<K>) {
        // The old root sits `depth - 1` levels above the leaves, so its
        // parent has height `depth - 1` as well (height 0 = leaf children).
        let height = (self.depth - 1) as u16;
        let root = InternodeNode::new_root(height, self.root, split.separator, split.right);
        let root_id = self.arena.alloc_internode(root);

        self.root = NodeRef::Internode(root_id);
        self.depth += 1;

        debug_log!(depth = self.depth, root = root_id.raw(), "root grew");
    }
}
