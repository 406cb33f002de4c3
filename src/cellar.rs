//! The cellar: a tree of dweller-carrying nodes addressed by parsed keys.

use std::borrow::Cow;
use std::collections::{btree_map, HashSet};

use log::{debug, trace};

use crate::dweller::Dweller;
use crate::error::{CellarError, Result};
use crate::node::{Node, NodeId};
use crate::parser::{Parser, Segments};

/// Construction options for a [`Cellar`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial capacity hint for the node arena
    pub initial_capacity: usize,
    /// Maximum number of nodes, root included. Capped at [`NodeId::MAX_NODES`].
    pub max_nodes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            max_nodes: NodeId::MAX_NODES,
        }
    }
}

/// A tree of nodes, each holding at most one dweller, addressed by keys.
///
/// Keys are turned into root-to-node paths by the parser `P`. Walking a
/// path creates any node that is missing, and dwellers are created the first
/// time their node is asked for one. Nothing is ever removed.
///
/// Lookups through [`get`](Self::get) and [`dive`](Self::dive) can create
/// nodes, so they take `&mut self`. Use [`find`](Self::find) and
/// [`peek`](Self::peek) when the tree must stay untouched.
pub struct Cellar<P: Parser, D: Dweller> {
    parser: P,
    nodes: Vec<Node<P::Segment, D>>,
    config: Config,
    dweller_config: D::Config,
}

impl<P: Parser, D: Dweller> Cellar<P, D> {
    /// Create an empty cellar with default configuration.
    pub fn new(parser: P) -> Self
    where
        D::Config: Default,
    {
        Self::with_config(parser, Config::default(), D::Config::default())
    }

    /// Create an empty cellar. `dweller_config` is passed to every dweller
    /// the cellar creates.
    pub fn with_config(parser: P, config: Config, dweller_config: D::Config) -> Self {
        let mut nodes = Vec::with_capacity(config.initial_capacity.max(1));
        nodes.push(Node::new(None));
        Self {
            parser,
            nodes,
            config,
            dweller_config,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True while the root is the only node.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<P::Segment, D>> {
        self.nodes.get(id.index())
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dweller_config(&self) -> &D::Config {
        &self.dweller_config
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Walk from the root along the key's segments, creating missing nodes,
    /// and return the node reached.
    ///
    /// Fails with [`CellarError::NodeLimit`] before creating anything if the
    /// missing nodes would not fit under [`Config::max_nodes`].
    pub fn dive(&mut self, key: &P::Key) -> Result<NodeId> {
        let segments = self.parse(key)?;

        let mut current = NodeId::ROOT;
        let mut depth = 0;
        while let Some(child) = segments
            .get(depth)
            .and_then(|segment| self.nodes[current.index()].child(segment))
        {
            current = child;
            depth += 1;
        }

        let needed = segments.len() - depth;
        let limit = self.config.max_nodes.min(NodeId::MAX_NODES);
        if needed > limit.saturating_sub(self.nodes.len()) {
            debug!("node limit {limit} reached, {needed} node(s) needed");
            return Err(CellarError::NodeLimit { needed, limit });
        }

        for segment in segments.into_iter().skip(depth) {
            current = self.add_child(current, segment)?;
        }
        Ok(current)
    }

    /// Like [`dive`](Self::dive) but never creates anything. `Ok(None)` when
    /// part of the path is missing.
    pub fn find(&self, key: &P::Key) -> Result<Option<NodeId>> {
        let segments = self.parse(key)?;
        let mut current = NodeId::ROOT;
        for segment in &segments {
            match self.nodes[current.index()].child(segment) {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Get-or-create the dweller for `key`.
    ///
    /// Repeated calls with keys that parse to the same segments return the
    /// same dweller.
    pub fn get(&mut self, key: &P::Key) -> Result<&mut D> {
        let id = self.dive(key)?;
        Ok(self.grab(id))
    }

    /// The dweller for `key`, only if both the node and its dweller exist.
    pub fn peek(&self, key: &P::Key) -> Result<Option<&D>> {
        Ok(self
            .find(key)?
            .and_then(|id| self.nodes[id.index()].dweller()))
    }

    /// Get-or-create the dweller of a node by handle.
    pub fn dweller(&mut self, id: NodeId) -> Result<&mut D> {
        self.check(id)?;
        Ok(self.grab(id))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// The dweller of the parent of `node`, created if needed.
    ///
    /// `node` is the dweller's [`Dweller::node`]. Returns `Ok(None)` at the
    /// root and [`CellarError::DetachedDweller`] for aggregation results.
    pub fn jump_up(&mut self, node: Option<NodeId>) -> Result<Option<&mut D>> {
        let id = node.ok_or(CellarError::DetachedDweller)?;
        self.check(id)?;
        match self.nodes[id.index()].parent() {
            Some(parent) => Ok(Some(self.grab(parent))),
            None => Ok(None),
        }
    }

    /// The parent's dweller if it has already been instantiated.
    pub fn peek_up(&self, node: Option<NodeId>) -> Result<Option<&D>> {
        let id = node.ok_or(CellarError::DetachedDweller)?;
        self.check(id)?;
        Ok(self.nodes[id.index()]
            .parent()
            .and_then(|parent| self.nodes[parent.index()].dweller()))
    }

    // =========================================================================
    // Aggregation
    // =========================================================================

    /// Aggregate the dweller of `node` with every dweller below it.
    ///
    /// Any node in `avoid` is skipped together with its whole subtree.
    /// Membership is by node identity, never by dweller value. If `node`
    /// itself is avoided the result is a fresh, empty, detached dweller.
    ///
    /// A node without children yields its own dweller, borrowed and
    /// unchanged. Otherwise children are visited in segment order, their
    /// dwellers are created on the way if missing, and the result is a new
    /// detached dweller.
    pub fn get_down(
        &mut self,
        node: Option<NodeId>,
        avoid: &HashSet<NodeId>,
    ) -> Result<Cow<'_, D>> {
        let id = node.ok_or(CellarError::DetachedDweller)?;
        self.check(id)?;
        if avoid.contains(&id) {
            return Ok(Cow::Owned(self.detached()));
        }

        let visited = self.instantiate_down(id, avoid);
        debug!(
            "aggregating {visited} node(s) below {id:?}, {} avoided",
            avoid.len()
        );
        Ok(self.fold_down(id, avoid))
    }

    /// Resolve `key` and each of `avoid` to nodes, then
    /// [`get_down`](Self::get_down).
    ///
    /// The start node is created if missing. Avoided keys that have no node
    /// are ignored since there is nothing below them to exclude.
    pub fn aggregate(&mut self, key: &P::Key, avoid: &[&P::Key]) -> Result<Cow<'_, D>> {
        let mut avoided = HashSet::with_capacity(avoid.len());
        for &k in avoid {
            self.parse(k)?;
        }
        // The start must exist before avoided keys are resolved, so that
        // avoiding the start itself is seen.
        let id = self.dive(key)?;
        self.grab(id);
        for &k in avoid {
            if let Some(avoided_id) = self.find(k)? {
                avoided.insert(avoided_id);
            }
        }
        self.get_down(Some(id), &avoided)
    }

    /// Create the dwellers `get_down` will read: the start node, and every
    /// child reached without crossing an avoided node. Avoided children get
    /// a dweller too; their descendants do not.
    fn instantiate_down(&mut self, id: NodeId, avoid: &HashSet<NodeId>) -> usize {
        if self.nodes[id.index()].is_leaf() {
            self.grab(id);
            return 1;
        }

        let mut visited = 0usize;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.grab(current);
            visited += 1;
            if avoid.contains(&current) {
                continue;
            }
            stack.extend(self.nodes[current.index()].children().values().copied());
        }
        visited
    }

    /// Post-order fold over an explicit stack. Each frame holds a node's
    /// remaining children and its running aggregate; a finished frame is
    /// folded into its parent's.
    fn fold_down(&self, id: NodeId, avoid: &HashSet<NodeId>) -> Cow<'_, D> {
        if avoid.contains(&id) {
            return Cow::Owned(self.detached());
        }

        let node = &self.nodes[id.index()];
        if node.is_leaf() {
            return self.resident(id);
        }

        let mut stack: Vec<(btree_map::Values<'_, P::Segment, NodeId>, Cow<'_, D>)> =
            vec![(node.children().values(), self.resident(id))];
        while let Some((children, _)) = stack.last_mut() {
            let below = match children.next() {
                Some(&child) if avoid.contains(&child) => Cow::Owned(self.detached()),
                Some(&child) => {
                    let child_node = &self.nodes[child.index()];
                    if !child_node.is_leaf() {
                        stack.push((child_node.children().values(), self.resident(child)));
                        continue;
                    }
                    self.resident(child)
                }
                None => match stack.pop() {
                    Some((_, done)) => done,
                    None => break,
                },
            };

            match stack.last_mut() {
                Some((_, acc)) => *acc = Cow::Owned(acc.aggregate(&below)),
                None => return below,
            }
        }

        // The start frame always returns from the loop.
        Cow::Owned(self.detached())
    }

    #[inline]
    fn resident(&self, id: NodeId) -> Cow<'_, D> {
        match self.nodes[id.index()].dweller() {
            Some(dweller) => Cow::Borrowed(dweller),
            None => Cow::Owned(self.detached()),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn parse(&self, key: &P::Key) -> Result<Segments<P::Segment>> {
        self.parser.parse(key).map_err(|e| {
            debug!("rejected key: {e}");
            e
        })
    }

    #[inline]
    fn check(&self, id: NodeId) -> Result<()> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(CellarError::UnknownNode(id))
        }
    }

    fn add_child(&mut self, parent: NodeId, segment: P::Segment) -> Result<NodeId> {
        let id = NodeId::try_from_usize(self.nodes.len()).ok_or(CellarError::NodeLimit {
            needed: 1,
            limit: NodeId::MAX_NODES,
        })?;
        self.nodes.push(Node::new(Some(parent)));
        self.nodes[parent.index()].children_mut().insert(segment, id);
        trace!("created node {id:?} under {parent:?}");
        Ok(id)
    }

    fn grab(&mut self, id: NodeId) -> &mut D {
        let config = &self.dweller_config;
        self.nodes[id.index()].dweller_slot().get_or_insert_with(|| {
            trace!("created dweller for {id:?}");
            D::new(Some(id), config)
        })
    }

    #[inline]
    fn detached(&self) -> D {
        D::new(None, &self.dweller_config)
    }
}

impl<P, D> Default for Cellar<P, D>
where
    P: Parser + Default,
    D: Dweller,
    D::Config: Default,
{
    fn default() -> Self {
        Self::new(P::default())
    }
}
