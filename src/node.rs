//! Cellar vertices.
//!
//! Nodes live in a flat arena owned by the [`Cellar`](crate::Cellar).
//! Parent and child links are arena indices, so the parent back-reference
//! never owns anything and the structure cannot form a cycle.

use std::collections::BTreeMap;

/// Handle to a node in a cellar's arena.
///
/// A node carries at most one dweller for its whole life, so the handle
/// doubles as the identity of that dweller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The root is always the first node allocated.
    pub(crate) const ROOT: NodeId = NodeId(0);

    /// Largest number of nodes a single arena can address.
    pub const MAX_NODES: usize = u32::MAX as usize + 1;

    /// Handle for an arena index, `None` if it does not fit in 32 bits.
    #[inline]
    pub(crate) fn try_from_usize(idx: usize) -> Option<Self> {
        u32::try_from(idx).ok().map(Self)
    }

    /// Arena index of this node.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

/// A tree vertex: child edges keyed by segment, a back-reference to the
/// parent and a lazily filled dweller slot.
#[derive(Clone, Debug)]
pub struct Node<S, D> {
    parent: Option<NodeId>,
    children: BTreeMap<S, NodeId>,
    dweller: Option<D>,
}

impl<S: Ord, D> Node<S, D> {
    pub(crate) fn new(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: BTreeMap::new(),
            dweller: None,
        }
    }

    /// Parent node, `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child edges in segment order.
    #[inline]
    pub fn children(&self) -> &BTreeMap<S, NodeId> {
        &self.children
    }

    #[inline]
    pub fn child(&self, segment: &S) -> Option<NodeId> {
        self.children.get(segment).copied()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The dweller, if one has been instantiated.
    #[inline]
    pub fn dweller(&self) -> Option<&D> {
        self.dweller.as_ref()
    }

    #[inline]
    pub(crate) fn children_mut(&mut self) -> &mut BTreeMap<S, NodeId> {
        &mut self.children
    }

    #[inline]
    pub(crate) fn dweller_slot(&mut self) -> &mut Option<D> {
        &mut self.dweller
    }
}
