//! Error type shared by every cellar operation.

use thiserror::Error;

use crate::node::NodeId;

/// Errors surfaced by [`Cellar`](crate::Cellar) operations.
///
/// Every error is a local contract violation. A call that fails leaves the
/// tree exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellarError {
    /// The configured parser could not turn the key into segments.
    #[error("invalid key {key}: {reason}")]
    InvalidKey {
        /// Debug rendering of the rejected key.
        key: String,
        /// Why the parser rejected it.
        reason: String,
    },
    /// The dweller is an aggregation result and belongs to no node.
    #[error("dweller is detached from the cellar")]
    DetachedDweller,
    /// Creating the key's missing nodes would exceed the node limit.
    #[error("node limit reached: {needed} more node(s) would exceed {limit}")]
    NodeLimit {
        /// Nodes the key still needed.
        needed: usize,
        /// Configured maximum, root included.
        limit: usize,
    },
    /// The handle does not name a node of this cellar.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
}

impl CellarError {
    pub(crate) fn invalid_key(key: impl std::fmt::Debug, reason: impl ToString) -> Self {
        Self::InvalidKey {
            key: format!("{key:?}"),
            reason: reason.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CellarError>;
