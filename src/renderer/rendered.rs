//! Materialised results - What a patch leaves behind.

use std::fmt;
use std::rc::Rc;

use crate::primitives::Getter;
use crate::reactive::Tracked;
use crate::types::NodeId;

/// Result of a patch, handed back as `previous` on the next one.
#[derive(Clone, PartialEq)]
pub enum Rendered {
    /// A single node: text, marker or element.
    Node(NodeId),
    /// A contiguous run of sibling nodes, in document order.
    List(Vec<NodeId>),
    /// A reactive slot; its current result changes on every re-run.
    Live(LiveSlot),
}

impl Rendered {
    /// Nodes currently owned by this result, resolving reactive slots.
    pub fn nodes(&self) -> Vec<NodeId> {
        match self {
            Rendered::Node(node) => vec![*node],
            Rendered::List(nodes) => nodes.clone(),
            Rendered::Live(slot) => slot.current().map(|r| r.nodes()).unwrap_or_default(),
        }
    }

    /// The single node of a `Node` result.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Rendered::Node(node) => Some(*node),
            Rendered::Live(slot) => slot.current().and_then(|r| r.node()),
            Rendered::List(_) => None,
        }
    }
}

impl fmt::Debug for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::Node(node) => write!(f, "Node({})", node),
            Rendered::List(nodes) => f.debug_tuple("List").field(nodes).finish(),
            Rendered::Live(slot) => slot.fmt(f),
        }
    }
}

/// A reactive value bound into the tree.
///
/// Holds the source getter (its identity decides whether a later patch
/// with the same value is a no-op) and the tracked computation whose
/// accumulator is the slot's latest result.
#[derive(Clone)]
pub struct LiveSlot {
    source: Getter,
    tracked: Tracked<Option<Rendered>>,
}

impl LiveSlot {
    pub(crate) fn new(source: Getter, tracked: Tracked<Option<Rendered>>) -> Self {
        Self { source, tracked }
    }

    /// Latest result of the slot.
    pub fn current(&self) -> Option<Rendered> {
        self.tracked.current()
    }

    /// Whether `getter` is the value this slot was created from.
    pub fn is_source(&self, getter: &Getter) -> bool {
        Rc::ptr_eq(&self.source, getter)
    }

    pub fn is_active(&self) -> bool {
        self.tracked.is_active()
    }

    /// Stop re-running. The nodes stay where they are.
    pub fn stop(&self) {
        self.tracked.stop();
    }
}

impl PartialEq for LiveSlot {
    fn eq(&self, other: &Self) -> bool {
        self.tracked.ptr_eq(&other.tracked)
    }
}

impl fmt::Debug for LiveSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Live")
            .field("active", &self.is_active())
            .field("current", &self.current())
            .finish()
    }
}
