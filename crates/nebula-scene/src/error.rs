//! Scene graph error types.

use crate::graph::NodeId;

/// Errors returned by structural operations on a [`SceneGraph`](crate::SceneGraph).
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The node id does not belong to this graph.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The node already has a parent and must be detached first.
    #[error("{0} already has a parent")]
    AlreadyParented(NodeId),

    /// Attaching would make a node its own ancestor.
    #[error("attaching {child} under {parent} would create a cycle")]
    WouldCycle { parent: NodeId, child: NodeId },

    /// The node is not a direct child of the given parent.
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// The component is not attached to the node.
    #[error("component not found on {0}")]
    ComponentNotFound(NodeId),
}
