//! Per-node payloads.

use crate::node::NodeId;

/// The value living in a cellar node.
///
/// A dweller knows which node it belongs to and can be aggregated with
/// another dweller of the same kind. Aggregation is the only primitive the
/// cellar uses to sum a subtree; it never looks inside a dweller.
///
/// `aggregate` should be associative and commutative. The cellar visits
/// children in segment order, so a non-commutative rule still gives a
/// reproducible answer, but that answer depends on how segments sort.
pub trait Dweller: Clone {
    /// Extra construction parameters, handed over by the cellar every time
    /// it creates a dweller.
    type Config;

    /// Create an empty dweller attached to `node`, or detached when `None`.
    fn new(node: Option<NodeId>, config: &Self::Config) -> Self;

    /// The node this dweller lives in. Aggregation results return `None`.
    fn node(&self) -> Option<NodeId>;

    /// Combine `self` with `other` into a new detached dweller.
    ///
    /// Neither input is modified.
    fn aggregate(&self, other: &Self) -> Self;
}

/// General purpose dweller holding a list of elements.
///
/// Aggregation concatenates: `self`'s elements followed by `other`'s. This
/// is not commutative, so the result of
/// [`Cellar::get_down`](crate::Cellar::get_down) lists a node's own
/// elements first and then each child subtree in segment order. Rely on the
/// element order only when that traversal order is what you want.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellarDweller<E> {
    node: Option<NodeId>,
    pub elements: Vec<E>,
}

impl<E> CellarDweller<E> {
    pub fn push(&mut self, element: E) {
        self.elements.push(element);
    }
}

impl<E: Clone> Dweller for CellarDweller<E> {
    type Config = ();

    fn new(node: Option<NodeId>, _config: &()) -> Self {
        Self {
            node,
            elements: Vec::new(),
        }
    }

    #[inline]
    fn node(&self) -> Option<NodeId> {
        self.node
    }

    fn aggregate(&self, other: &Self) -> Self {
        let mut elements = Vec::with_capacity(self.elements.len() + other.elements.len());
        elements.extend_from_slice(&self.elements);
        elements.extend_from_slice(&other.elements);
        Self {
            node: None,
            elements,
        }
    }
}
