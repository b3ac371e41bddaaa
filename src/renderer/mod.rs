//! Renderer - Patches declarative values into a target tree.
//!
//! # Architecture
//!
//! ```text
//! View ──patch──► classify ──► text / marker / element / sequence / reactive
//!                                 │            │            │
//!                              set_text     assign      reconcile ──► diff
//! ```
//!
//! A [`Renderer`] owns the per-node records (last applied props, previous
//! child result) and the event delegation registry for one tree. Every
//! patch returns a [`Rendered`] that the caller hands back as `previous`
//! next time; that threading is what makes patches minimal.
//!
//! # Ownership
//!
//! Reactive child slots and property bindings are stopped when they are
//! superseded, when their node is released, or when the enclosing mount
//! scope stops. Released nodes lose their records, their direct listeners
//! and their delegation slots.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use spark_patch::{element, Document, RenderConfig, Renderer};
//!
//! let doc = Rc::new(Document::new());
//! let renderer = Renderer::new(doc.clone(), RenderConfig::default());
//! let first = renderer.patch(doc.root(), element("p").child("hello"), None)?;
//! renderer.patch(doc.root(), element("p").child("world"), Some(first))?;
//! ```

mod assign;
mod diff;
mod patch;
mod reconcile;
mod record;
mod rendered;

pub use diff::diff;
pub use rendered::{LiveSlot, Rendered};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::{error, trace, warn};

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::events::EventDelegation;
use crate::tree::{Event, TargetTree};
use crate::types::{EventFlags, NodeId};
use record::{Entry, NodeRecord};

// =============================================================================
// Renderer
// =============================================================================

/// Patch engine bound to one target tree.
///
/// Cheap to clone; clones share records and the delegation registry.
pub struct Renderer<T: TargetTree + 'static> {
    inner: Rc<Inner<T>>,
}

struct Inner<T: TargetTree + 'static> {
    tree: Rc<T>,
    config: RenderConfig,
    records: RefCell<HashMap<NodeId, NodeRecord>>,
    delegation: EventDelegation,
    /// Failures from reactive re-runs, which have no caller to return to.
    errors: RefCell<Vec<RenderError>>,
}

impl<T: TargetTree + 'static> Drop for Inner<T> {
    fn drop(&mut self) {
        self.delegation.clear(self.tree.as_ref());
    }
}

impl<T: TargetTree + 'static> Clone for Renderer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Non-owning handle captured by effects.
pub(crate) struct WeakRenderer<T: TargetTree + 'static>(Weak<Inner<T>>);

impl<T: TargetTree + 'static> WeakRenderer<T> {
    pub(crate) fn upgrade(&self) -> Option<Renderer<T>> {
        self.0.upgrade().map(|inner| Renderer { inner })
    }
}

impl<T: TargetTree + 'static> Renderer<T> {
    pub fn new(tree: Rc<T>, config: RenderConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                tree,
                config,
                records: RefCell::new(HashMap::new()),
                delegation: EventDelegation::new(),
                errors: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn tree(&self) -> &Rc<T> {
        &self.inner.tree
    }

    pub fn config(&self) -> &RenderConfig {
        &self.inner.config
    }

    pub fn delegation(&self) -> &EventDelegation {
        &self.inner.delegation
    }

    /// Drain the errors raised by reactive re-runs since the last call.
    pub fn take_errors(&self) -> Vec<RenderError> {
        std::mem::take(&mut *self.inner.errors.borrow_mut())
    }

    /// Whether the renderer holds a record for `node`.
    pub fn is_tracked(&self, node: NodeId) -> bool {
        self.inner.records.borrow().contains_key(&node)
    }

    pub(crate) fn downgrade(&self) -> WeakRenderer<T> {
        WeakRenderer(Rc::downgrade(&self.inner))
    }

    pub(crate) fn record_error(&self, err: RenderError) {
        error!("reactive update failed: {}", err);
        self.inner.errors.borrow_mut().push(err);
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Take a node's record out of the map. Callers put it back when done,
    /// so no borrow is held while user code runs.
    pub(crate) fn take_record(&self, node: NodeId) -> NodeRecord {
        self.inner
            .records
            .borrow_mut()
            .remove(&node)
            .unwrap_or_default()
    }

    pub(crate) fn put_record(&self, node: NodeId, record: NodeRecord) {
        self.inner.records.borrow_mut().insert(node, record);
    }

    pub(crate) fn take_children(&self, node: NodeId) -> Option<Rendered> {
        self.inner
            .records
            .borrow_mut()
            .get_mut(&node)
            .and_then(|record| record.children.take())
    }

    pub(crate) fn store_children(&self, node: NodeId, children: Option<Rendered>) {
        self.inner
            .records
            .borrow_mut()
            .entry(node)
            .or_default()
            .children = children;
    }

    /// Run the `oninsert` hook of each node in `inserted`. Callers pass the
    /// nodes they just attached to a parent, after the tree is settled.
    pub(crate) fn notify_inserted(&self, inserted: &[NodeId]) {
        for &node in inserted {
            let hook = self
                .inner
                .records
                .borrow()
                .get(&node)
                .and_then(|record| record.props.insert_hook());
            if let Some(hook) = hook {
                trace!("{}: insert hook", node);
                let event = Event::with_flags("insert", EventFlags::NONE);
                event.set_target(Some(node));
                event.set_current_target(Some(node));
                hook(&event);
            }
        }
    }

    // =========================================================================
    // Release
    // =========================================================================

    /// Forget everything the renderer attached to `node` and its subtree:
    /// bindings, reactive child slots, direct listeners and delegation slots.
    ///
    /// Does not detach the node; callers remove it first.
    pub fn release(&self, node: NodeId) {
        let record = self.inner.records.borrow_mut().remove(&node);
        if let Some(record) = record {
            if let Some(children) = &record.children {
                stop_slots(children);
            }
            for (key, entry) in record.props.entries {
                if let Entry::Handler {
                    listener: Some(id), ..
                } = entry
                {
                    if let Err(err) = self.tree().remove_listener(node, id) {
                        warn!("{}: failed to remove listener for {:?}: {}", node, key, err);
                    }
                }
            }
        }
        self.inner.delegation.remove_handlers(node);

        for child in self.tree().children(node) {
            self.release(child);
        }
    }

    /// Stop every binding and reactive child slot in `node`'s subtree.
    /// Nodes, listeners and recorded values stay as they are.
    pub(crate) fn freeze(&self, node: NodeId) {
        let mut bindings = Vec::new();
        let children = {
            let mut records = self.inner.records.borrow_mut();
            match records.get_mut(&node) {
                Some(record) => {
                    for entry in record.props.entries.values_mut() {
                        entry.take_bindings(&mut bindings);
                    }
                    record.children.clone()
                }
                None => None,
            }
        };
        drop(bindings);
        if let Some(children) = children {
            stop_slots(&children);
        }

        for child in self.tree().children(node) {
            self.freeze(child);
        }
    }

    /// Detach `nodes` from `container` (where still attached) and release them.
    pub(crate) fn discard(&self, container: NodeId, nodes: &[NodeId]) -> Result<(), RenderError> {
        for &node in nodes {
            if self.tree().parent(node) == Some(container) {
                self.tree().remove_child(container, node)?;
            }
            self.release(node);
        }
        Ok(())
    }
}

/// Stop a reactive result and every slot nested in its current value.
pub(crate) fn stop_slots(rendered: &Rendered) {
    if let Rendered::Live(slot) = rendered {
        slot.stop();
        if let Some(inner) = slot.current() {
            stop_slots(&inner);
        }
    }
}
