//! Node storage for [`BPlusTree`](crate::BPlusTree).
//!
//! Every node lives in a [`NodeArena`]: leaves and internodes each in their
//! own vector, so both kinds keep their own dense, cache-aligned layout.
//! Nodes are addressed by stable 32-bit handles ([`LeafId`], [`InternodeId`]).
//! The arena is the only owner; a parent's child slot and a leaf's sibling
//! link are plain handles and never own anything.
//!
//! Nodes are never freed individually. The tree only grows, and dropping the
//! arena releases every node at once.

use std::fmt as StdFmt;
use std::mem as StdMem;

use crate::internode::InternodeNode;
use crate::leaf::LeafNode;
use crate::tree::TreeError;

/// Largest handle the arena hands out (exclusive).
const MAX_NODES: usize = u32::MAX as usize;

// ============================================================================
//  Handles
// ============================================================================

/// Handle to a leaf node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(u32);

/// Handle to an internode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternodeId(u32);

impl LeafId {
    /// Raw handle value, as stored in internode child slots.
    #[must_use]
    #[inline(always)]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Rebuild a handle from a child slot.
    #[must_use]
    #[inline(always)]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline(always)]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl InternodeId {
    /// Raw handle value, as stored in internode child slots.
    #[must_use]
    #[inline(always)]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Rebuild a handle from a child slot.
    #[must_use]
    #[inline(always)]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline(always)]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node of either kind.
///
/// Descent matches on this at every level instead of dispatching through a
/// trait object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRef {
    /// A leaf holding entries.
    Leaf(LeafId),

    /// An internode holding separators and children.
    Internode(InternodeId),
}

impl NodeRef {
    /// Raw handle value, without the kind tag.
    #[must_use]
    #[inline(always)]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Leaf(id) => id.raw(),
            Self::Internode(id) => id.raw(),
        }
    }

    /// Check if this refers to a leaf.
    #[must_use]
    #[inline(always)]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Self::Leaf(_))
    }
}

// ============================================================================
//  NodeArena
// ============================================================================

/// Owner of every node in one tree.
pub struct NodeArena<K, V, const WIDTH: usize> {
    leaves: Vec<LeafNode<K, V, WIDTH>>,
    internodes: Vec<InternodeNode<K, WIDTH>>,

    /// Handle space per node kind. `MAX_NODES` outside tests.
    node_limit: usize,
}

impl<K, V, const WIDTH: usize> StdFmt::Debug for NodeArena<K, V, WIDTH> {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.debug_struct("NodeArena")
            .field("leaves", &self.leaves.len())
            .field("internodes", &self.internodes.len())
            .finish()
    }
}

impl<K, V, const WIDTH: usize> Default for NodeArena<K, V, WIDTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, const WIDTH: usize> NodeArena<K, V, WIDTH> {
    /// Create an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            leaves: Vec::new(),
            internodes: Vec::new(),
            node_limit: MAX_NODES,
        }
    }

    /// Make room for the worst case of one insert.
    ///
    /// A single insert allocates at most one leaf and `levels` internodes
    /// (one per internode on the descent path plus a new root). Reserving up
    /// front means a failed allocation is reported before any node changes.
    ///
    /// # Errors
    ///
    /// [`TreeError::AllocationFailed`] if either vector cannot grow or the
    /// handle space is exhausted.
    pub fn reserve_split_path(&mut self, levels: usize) -> Result<(), TreeError> {
        if self.leaves.len() >= self.node_limit || self.internodes.len() + levels > self.node_limit {
            return Err(TreeError::AllocationFailed);
        }

        self.leaves
            .try_reserve(1)
            .map_err(|_| TreeError::AllocationFailed)?;
        self.internodes
            .try_reserve(levels)
            .map_err(|_| TreeError::AllocationFailed)?;

        Ok(())
    }

    /// Shrink the handle space so exhaustion can be reached in tests.
    #[cfg(test)]
    pub(crate) const fn set_node_limit(&mut self, limit: usize) {
        self.node_limit = limit;
    }

    /// Store a leaf and return its handle.
    #[allow(clippy::cast_possible_truncation, reason = "bounded by MAX_NODES")]
    pub fn alloc_leaf(&mut self, leaf: LeafNode<K, V, WIDTH>) -> LeafId {
        debug_assert!(self.leaves.len() < self.node_limit, "leaf handle space exhausted");
        let id = LeafId(self.leaves.len() as u32);
        self.leaves.push(leaf);
        id
    }

    /// Store an internode and return its handle.
    #[allow(clippy::cast_possible_truncation, reason = "bounded by MAX_NODES")]
    pub fn alloc_internode(&mut self, node: InternodeNode<K, WIDTH>) -> InternodeId {
        debug_assert!(self.internodes.len() < self.node_limit, "internode handle space exhausted");
        let id = InternodeId(self.internodes.len() as u32);
        self.internodes.push(node);
        id
    }

    // ========================================================================
    //  Accessors
    // ========================================================================

    /// Borrow a leaf.
    #[must_use]
    #[inline(always)]
    pub fn leaf(&self, id: LeafId) -> &LeafNode<K, V, WIDTH> {
        &self.leaves[id.index()]
    }

    /// Mutably borrow a leaf.
    #[inline(always)]
    pub fn leaf_mut(&mut self, id: LeafId) -> &mut LeafNode<K, V, WIDTH> {
        &mut self.leaves[id.index()]
    }

    /// Borrow an internode.
    #[must_use]
    #[inline(always)]
    pub fn internode(&self, id: InternodeId) -> &InternodeNode<K, WIDTH> {
        &self.internodes[id.index()]
    }

    /// Mutably borrow an internode.
    #[inline(always)]
    pub fn internode_mut(&mut self, id: InternodeId) -> &mut InternodeNode<K, WIDTH> {
        &mut self.internodes[id.index()]
    }

    /// All leaves in allocation order (not key order).
    #[must_use]
    pub fn leaves(&self) -> &[LeafNode<K, V, WIDTH>] {
        &self.leaves
    }

    /// All internodes in allocation order.
    #[must_use]
    pub fn internodes(&self) -> &[InternodeNode<K, WIDTH>] {
        &self.internodes
    }

    /// Number of leaves allocated.
    #[must_use]
    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Number of internodes allocated.
    #[must_use]
    #[inline]
    pub fn internode_count(&self) -> usize {
        self.internodes.len()
    }

    /// Bytes occupied by live nodes, each counted at its full padded size
    /// (header, slot arrays and alignment padding).
    #[must_use]
    pub fn node_bytes(&self) -> usize {
        self.leaves.len() * StdMem::size_of::<LeafNode<K, V, WIDTH>>()
            + self.internodes.len() * StdMem::size_of::<InternodeNode<K, WIDTH>>()
    }
}
