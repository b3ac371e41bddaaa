//! Error types for the patch engine and target trees.

use thiserror::Error;

use crate::types::NodeId;

/// Failures reported by a target tree when a primitive operation is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("node {0} cannot hold children")]
    NotAContainer(NodeId),

    #[error("inserting {child} into {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

/// Failures reported by the patch engine.
///
/// These signal caller contract violations and fail fast: silently
/// dropping content would desynchronize the previous-result threading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A node passed through as a declarative value is not part of the tree.
    #[error("value refers to unknown node {0}")]
    UnknownNode(NodeId),

    /// The previous result is not attached to the container being patched.
    #[error("previous result {node} is not attached to container {container}")]
    Detached { container: NodeId, node: NodeId },

    /// The same node appears twice in one flattened sequence.
    #[error("node {0} appears more than once in a sequence")]
    DuplicateNode(NodeId),

    /// Element description with an unusable tag name.
    #[error("invalid element tag {0:?}")]
    InvalidTag(String),

    /// The effect scope meant to own a mount was already stopped.
    #[error("mount scope for container {0} is no longer active")]
    ScopeInactive(NodeId),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RenderError::Detached { container: NodeId(0), node: NodeId(4) };
        assert_eq!(err.to_string(), "previous result #4 is not attached to container #0");

        let err: RenderError = TreeError::NotAContainer(NodeId(2)).into();
        assert_eq!(err.to_string(), "node #2 cannot hold children");
    }
}
