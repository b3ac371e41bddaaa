//! Event Delegation Registry
//!
//! One root listener per registered event name, multiplexed to per-node
//! handler slots by walking from the event target up the parent chain.
//!
//! The registry is an explicit object owned by a renderer rather than
//! process-wide state, so independent renderers (and tests) never see
//! each other's slots. Its lifetime is the renderer's lifetime unless
//! [`EventDelegation::clear`] tears it down earlier.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use log::debug;

use crate::tree::{Event, EventHandler, ListenerId, TargetTree};
use crate::types::NodeId;

type Slots = Rc<RefCell<HashMap<NodeId, HashMap<String, EventHandler>>>>;

/// Delegated event registry.
pub struct EventDelegation {
    /// Event name → root listener attached for it.
    registered: RefCell<IndexMap<String, ListenerId>>,
    /// Per-node handler slots, shared with every root listener.
    slots: Slots,
}

impl Default for EventDelegation {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDelegation {
    pub fn new() -> Self {
        Self {
            registered: RefCell::new(IndexMap::new()),
            slots: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Attach the root listener for `event` unless it is already attached.
    pub fn register<T: TargetTree + 'static>(&self, tree: &Rc<T>, event: &str) {
        if self.registered.borrow().contains_key(event) {
            return;
        }

        let weak: Weak<T> = Rc::downgrade(tree);
        let slots = self.slots.clone();
        let name = event.to_string();
        let listener: EventHandler = Rc::new(move |ev: &Event| {
            let Some(tree) = weak.upgrade() else { return };
            dispatch(tree.as_ref(), &slots, &name, ev);
        });

        let id = tree.add_root_listener(event, listener);
        self.registered.borrow_mut().insert(event.to_string(), id);
        debug!("delegation: registered root listener for {:?}", event);
    }

    pub fn is_registered(&self, event: &str) -> bool {
        self.registered.borrow().contains_key(event)
    }

    /// Registered event names, in registration order.
    pub fn events(&self) -> Vec<String> {
        self.registered.borrow().keys().cloned().collect()
    }

    /// Install (`Some`) or clear (`None`) the handler slot of `node` for `event`.
    pub fn set_handler(&self, node: NodeId, event: &str, handler: Option<EventHandler>) {
        let mut slots = self.slots.borrow_mut();
        match handler {
            Some(handler) => {
                slots.entry(node).or_default().insert(event.to_string(), handler);
            }
            None => {
                if let Some(node_slots) = slots.get_mut(&node) {
                    node_slots.remove(event);
                    if node_slots.is_empty() {
                        slots.remove(&node);
                    }
                }
            }
        }
    }

    pub fn has_handler(&self, node: NodeId, event: &str) -> bool {
        self.slots
            .borrow()
            .get(&node)
            .is_some_and(|node_slots| node_slots.contains_key(event))
    }

    /// Drop every handler slot of `node`.
    pub fn remove_handlers(&self, node: NodeId) {
        self.slots.borrow_mut().remove(&node);
    }

    /// Detach every root listener and forget all slots.
    pub fn clear<T: TargetTree>(&self, tree: &T) {
        let registered: Vec<(String, ListenerId)> = self.registered.borrow_mut().drain(..).collect();
        for (event, id) in registered {
            tree.remove_root_listener(id);
            debug!("delegation: removed root listener for {:?}", event);
        }
        self.slots.borrow_mut().clear();
    }
}

/// Walk from the event target towards the root, invoking slots for `name`.
fn dispatch<T: TargetTree + ?Sized>(tree: &T, slots: &Slots, name: &str, event: &Event) {
    let mut current = event.target();
    while let Some(node) = current {
        // Clone the handler out so the slot table is free while it runs.
        let handler = slots.borrow().get(&node).and_then(|s| s.get(name).cloned());
        if let Some(handler) = handler {
            event.set_current_target(Some(node));
            handler(event);
            if event.is_propagation_stopped() {
                break;
            }
        }
        current = tree.parent(node);
    }
    event.set_current_target(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Document;
    use crate::types::Namespace;
    use std::cell::Cell;

    fn setup() -> (Rc<Document>, NodeId, NodeId) {
        let doc = Rc::new(Document::new());
        let outer = doc.create_element("div", Namespace::Html);
        let inner = doc.create_element("button", Namespace::Html);
        doc.append_child(doc.root(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        (doc, outer, inner)
    }

    #[test]
    fn test_register_is_idempotent() {
        let (doc, _, _) = setup();
        let delegation = EventDelegation::new();

        delegation.register(&doc, "click");
        delegation.register(&doc, "click");

        assert!(delegation.is_registered("click"));
        assert_eq!(doc.root_listener_count(), 1, "second register should be a no-op");
    }

    #[test]
    fn test_dispatch_walks_parent_chain() {
        let (doc, outer, inner) = setup();
        let delegation = EventDelegation::new();
        delegation.register(&doc, "click");

        let hits = Rc::new(RefCell::new(Vec::new()));
        let h = hits.clone();
        delegation.set_handler(
            outer,
            "click",
            Some(Rc::new(move |e: &Event| h.borrow_mut().push(e.current_target()))),
        );

        doc.dispatch_event(inner, &Event::new("click")).unwrap();
        assert_eq!(*hits.borrow(), vec![Some(outer)], "outer slot should see the bubbled click");
    }

    #[test]
    fn test_stop_propagation_ends_walk() {
        let (doc, outer, inner) = setup();
        let delegation = EventDelegation::new();
        delegation.register(&doc, "click");

        let outer_hits = Rc::new(Cell::new(0));
        let o = outer_hits.clone();
        delegation.set_handler(outer, "click", Some(Rc::new(move |_e: &Event| o.set(o.get() + 1))));
        delegation.set_handler(inner, "click", Some(Rc::new(|e: &Event| e.stop_propagation())));

        doc.dispatch_event(inner, &Event::new("click")).unwrap();
        assert_eq!(outer_hits.get(), 0);
    }

    #[test]
    fn test_clear_removes_listeners() {
        let (doc, _, inner) = setup();
        let delegation = EventDelegation::new();
        delegation.register(&doc, "click");
        delegation.register(&doc, "keydown");

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        delegation.set_handler(inner, "click", Some(Rc::new(move |_e: &Event| h.set(h.get() + 1))));

        delegation.clear(doc.as_ref());
        assert_eq!(doc.root_listener_count(), 0);
        assert!(delegation.events().is_empty());

        doc.dispatch_event(inner, &Event::new("click")).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_set_handler_none_clears_slot() {
        let (_, _, inner) = setup();
        let delegation = EventDelegation::new();
        delegation.set_handler(inner, "click", Some(Rc::new(|_e: &Event| {})));
        assert!(delegation.has_handler(inner, "click"));
        delegation.set_handler(inner, "click", None);
        assert!(!delegation.has_handler(inner, "click"));
    }
}
