//! Events dispatched through a target tree.

use std::cell::Cell;
use std::rc::Rc;

use crate::events::event_flags;
use crate::types::{EventFlags, NodeId};

/// Listener callback. `Rc` so a handler can be shared between a node's
/// property record and the tree that invokes it.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Identifies one attached listener for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub usize);

/// An event travelling from its target towards the root.
#[derive(Debug)]
pub struct Event {
    name: String,
    flags: EventFlags,
    detail: Option<String>,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    /// Create an event whose bubbling traits come from the static event table.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let flags = event_flags(&name);
        Self::with_flags(name, flags)
    }

    /// Create an event with explicit traits (custom events).
    pub fn with_flags(name: impl Into<String>, flags: EventFlags) -> Self {
        Self {
            name: name.into(),
            flags,
            detail: None,
            target: Cell::new(None),
            current_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// Attach a payload, like `CustomEvent::detail`.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn bubbles(&self) -> bool {
        self.flags.contains(EventFlags::BUBBLES)
    }

    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// Node the event was dispatched at.
    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// Node whose handler is currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    /// Stop the event from reaching further ancestors.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn prevent_default(&self) {
        if self.flags.contains(EventFlags::CANCELABLE) {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_target(&self, node: Option<NodeId>) {
        self.target.set(node);
    }

    pub(crate) fn set_current_target(&self, node: Option<NodeId>) {
        self.current_target.set(node);
    }
}
