//! Target Tree - The mutable structure the engine patches.
//!
//! The engine never touches a concrete tree directly. It only needs the
//! primitive operations of [`TargetTree`]: create a leaf or container,
//! attach/move/detach nodes, set text, set attribute-like properties, and
//! a handful of queries.
//!
//! # Identity
//!
//! Nodes are addressed by [`NodeId`] handles. Handle equality is node
//! identity, which is what the list reconciler compares.
//!
//! # Interior mutability
//!
//! Every method takes `&self`, the way DOM bindings do. Reactive effects
//! hold a shared reference to the tree and patch it whenever they re-run,
//! so implementations keep their state behind a `RefCell` and never hold
//! a borrow while calling back into user code (event handlers).
//!
//! [`Document`] is the bundled in-memory implementation.

mod document;
mod event;

pub use document::{Document, Mutation, MutationCounts};
pub use event::{Event, EventHandler, ListenerId};

use crate::error::TreeError;
use crate::types::{Namespace, NodeId, NodeKind, Scalar};

/// Primitive operations the patch engine consumes from a target tree.
pub trait TargetTree {
    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Create a detached element node.
    fn create_element(&self, tag: &str, namespace: Namespace) -> NodeId;

    /// Create a detached text node.
    fn create_text(&self, text: &str) -> NodeId;

    /// Create a detached marker (comment) node carrying `payload`.
    fn create_marker(&self, payload: &str) -> NodeId;

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    /// Append `child` as the last child of `parent`, moving it if attached.
    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError>;

    /// Insert `child` before `reference`; `None` appends.
    fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), TreeError>;

    /// Put `new_child` where `old_child` is and detach `old_child`.
    fn replace_child(
        &self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), TreeError>;

    /// Detach `child` from `parent`.
    fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError>;

    // -------------------------------------------------------------------------
    // Content
    // -------------------------------------------------------------------------

    /// Replace the text of a text or marker node.
    fn set_text(&self, node: NodeId, text: &str) -> Result<(), TreeError>;

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), TreeError>;

    fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), TreeError>;

    fn set_attribute_ns(
        &self,
        node: NodeId,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), TreeError>;

    fn remove_attribute_ns(&self, node: NodeId, namespace: &str, name: &str)
    -> Result<(), TreeError>;

    /// Assign a node property (not reflected as an attribute).
    fn set_property(&self, node: NodeId, name: &str, value: &Scalar) -> Result<(), TreeError>;

    /// Set (`Some`) or clear (`None`) a single style entry.
    fn set_style(&self, node: NodeId, name: &str, value: Option<&str>) -> Result<(), TreeError>;

    /// Replace the whole class list with a space-separated class name.
    fn set_class_name(&self, node: NodeId, value: &str) -> Result<(), TreeError>;

    /// Add or remove a single class.
    fn toggle_class(&self, node: NodeId, class: &str, on: bool) -> Result<(), TreeError>;

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Attach a listener directly on a node.
    fn add_listener(
        &self,
        node: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<ListenerId, TreeError>;

    fn remove_listener(&self, node: NodeId, id: ListenerId) -> Result<(), TreeError>;

    /// Attach a listener at the stable root (the document).
    fn add_root_listener(&self, event: &str, handler: EventHandler) -> ListenerId;

    fn remove_root_listener(&self, id: ListenerId);

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    fn contains(&self, node: NodeId) -> bool;

    fn kind(&self, node: NodeId) -> Option<NodeKind>;

    /// Tag name of an element node.
    fn tag(&self, node: NodeId) -> Option<String>;

    fn namespace(&self, node: NodeId) -> Option<Namespace>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Content of a text or marker node.
    fn text(&self, node: NodeId) -> Option<String>;

    // -------------------------------------------------------------------------
    // Predicates
    // -------------------------------------------------------------------------

    fn is_text(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Text)
    }

    fn is_marker(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Marker)
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Element)
    }

    /// Whether `node` is an element of the kind `tag` describes.
    fn is_same_element(&self, node: NodeId, tag: &str) -> bool {
        self.tag(node).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }
}
