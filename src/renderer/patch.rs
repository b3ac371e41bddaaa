//! Patch - Classify a value and bring a container's region in line with it.
//!
//! | Value                | Previous                 | Action                          |
//! |----------------------|--------------------------|---------------------------------|
//! | text                 | text node                | `set_text` when different       |
//! | text                 | anything else            | new text node swapped in        |
//! | empty                | marker                   | payload updated when different  |
//! | empty                | anything else            | new marker swapped in           |
//! | reactive             | same reactive slot       | nothing                         |
//! | reactive             | anything                 | tracked slot, seeded with prev  |
//! | sequence             | anything                 | flatten and reconcile           |
//! | sequence w/ reactive | anything                 | one tracked slot around it      |
//! | node                 | same node                | nothing                         |
//! | node                 | anything else            | moved into place                |
//! | element              | element with same tag    | differential update             |
//! | element              | anything else            | materialised and swapped in     |

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, trace};

use super::diff::diff;
use super::rendered::{LiveSlot, Rendered};
use super::Renderer;
use crate::error::{RenderError, Result};
use crate::primitives::{ElementSpec, Getter, Marker, View};
use crate::reactive::track;
use crate::tree::TargetTree;
use crate::types::NodeId;

impl<T: TargetTree + 'static> Renderer<T> {
    /// Bring `container`'s region, currently holding `previous`, in line
    /// with `value`. Returns the result to pass as `previous` next time.
    ///
    /// `previous` must be the result of the last patch of the same region
    /// (or `None` for an empty region appended at the end of `container`).
    pub fn patch(
        &self,
        container: NodeId,
        value: impl Into<View>,
        previous: Option<Rendered>,
    ) -> Result<Rendered> {
        self.patch_view(container, value.into(), previous)
    }

    pub(crate) fn patch_view(
        &self,
        container: NodeId,
        value: View,
        previous: Option<Rendered>,
    ) -> Result<Rendered> {
        if !self.tree().contains(container) {
            return Err(RenderError::UnknownNode(container));
        }

        let previous = match previous {
            Some(Rendered::Live(slot)) => {
                if let View::Reactive(getter) = &value {
                    if slot.is_active() && slot.is_source(getter) {
                        return Ok(Rendered::Live(slot));
                    }
                }
                settle(slot)
            }
            other => other,
        };

        if let (View::Node(node), Some(Rendered::Node(prev))) = (&value, &previous) {
            if node == prev {
                return Ok(Rendered::Node(*prev));
            }
        }

        let old = previous.as_ref().map(Rendered::nodes).unwrap_or_default();
        self.check_attached(container, &old)?;

        match value {
            View::Text(text) => self.patch_text(container, &text, &old),
            View::Empty(marker) => self.clear(container, marker.payload(), &old),
            View::Reactive(getter) => self.patch_reactive(container, getter, previous),
            View::Sequence(items) if has_reactive_items(&items) => {
                let getter: Getter = Rc::new(move || View::Sequence(items.clone()));
                self.bind_slot(container, getter, previous, move |renderer, value, prev| match value {
                    View::Sequence(items) => renderer.patch_sequence(container, items, prev),
                    other => renderer.patch_view(container, other, prev),
                })
            }
            View::Sequence(items) => self.patch_sequence(container, items, previous),
            View::Node(node) => self.patch_node(container, node, &old),
            View::Element(spec) => self.patch_element(container, spec, previous, &old),
        }
    }

    fn check_attached(&self, container: NodeId, old: &[NodeId]) -> Result<()> {
        for &node in old {
            if self.tree().parent(node) != Some(container) {
                return Err(RenderError::Detached { container, node });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Text and markers
    // =========================================================================

    fn patch_text(&self, container: NodeId, text: &str, old: &[NodeId]) -> Result<Rendered> {
        let tree = self.tree();
        if let Some((&first, rest)) = old.split_first() {
            if tree.is_text(first) {
                if tree.text(first).as_deref() != Some(text) {
                    tree.set_text(first, text)?;
                }
                self.discard(container, rest)?;
                return Ok(Rendered::Node(first));
            }
        }
        let node = tree.create_text(text);
        self.swap_in(container, node, old)?;
        Ok(Rendered::Node(node))
    }

    /// Leave a single marker carrying `payload` where `old` was.
    pub(crate) fn clear(&self, container: NodeId, payload: &str, old: &[NodeId]) -> Result<Rendered> {
        let tree = self.tree();
        if let Some((&first, rest)) = old.split_first() {
            if tree.is_marker(first) {
                if tree.text(first).as_deref() != Some(payload) {
                    tree.set_text(first, payload)?;
                }
                self.discard(container, rest)?;
                return Ok(Rendered::Node(first));
            }
        }
        let marker = tree.create_marker(payload);
        self.swap_in(container, marker, old)?;
        Ok(Rendered::Node(marker))
    }

    /// Put the fresh `node` where `old` was and drop `old`.
    fn swap_in(&self, container: NodeId, node: NodeId, old: &[NodeId]) -> Result<()> {
        let tree = self.tree();
        match old {
            [] => tree.append_child(container, node)?,
            [single] => {
                tree.replace_child(container, node, *single)?;
                self.release(*single);
            }
            [first, ..] => {
                tree.insert_before(container, node, Some(*first))?;
                self.discard(container, old)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Nodes and elements
    // =========================================================================

    fn patch_node(&self, container: NodeId, node: NodeId, old: &[NodeId]) -> Result<Rendered> {
        let tree = self.tree();
        if !tree.contains(node) {
            return Err(RenderError::UnknownNode(node));
        }
        let inserted = tree.parent(node) != Some(container);
        diff(tree.as_ref(), container, old, &[node])?;
        let stale: Vec<NodeId> = old.iter().copied().filter(|&n| n != node).collect();
        self.discard(container, &stale)?;
        if inserted {
            self.notify_inserted(&[node]);
        }
        Ok(Rendered::Node(node))
    }

    fn patch_element(
        &self,
        container: NodeId,
        spec: ElementSpec,
        previous: Option<Rendered>,
        old: &[NodeId],
    ) -> Result<Rendered> {
        let tag = self.tag_for(&spec)?;
        if let Some(Rendered::Node(prev)) = previous {
            if self.tree().is_same_element(prev, &tag) {
                trace!("patch {}: update <{}> {}", container, tag, prev);
                self.update(prev, spec)?;
                return Ok(Rendered::Node(prev));
            }
        }
        let node = self.materialize_in(Some(container), spec)?;
        self.patch_node(container, node, old)
    }

    /// Tag for `spec`, falling back to the configured default.
    pub(crate) fn tag_for(&self, spec: &ElementSpec) -> Result<String> {
        let tag = spec
            .tag
            .clone()
            .unwrap_or_else(|| self.config().default_tag.clone());
        if tag.is_empty() || tag.contains(char::is_whitespace) {
            return Err(RenderError::InvalidTag(tag));
        }
        Ok(tag)
    }

    // =========================================================================
    // Reactive values
    // =========================================================================

    fn patch_reactive(
        &self,
        container: NodeId,
        getter: Getter,
        previous: Option<Rendered>,
    ) -> Result<Rendered> {
        self.bind_slot(container, getter, previous, move |renderer, value, prev| {
            renderer.patch_view(container, value, prev)
        })
    }

    /// Flatten `items` and reconcile them against `previous`.
    fn patch_sequence(
        &self,
        container: NodeId,
        items: Vec<View>,
        previous: Option<Rendered>,
    ) -> Result<Rendered> {
        let old = previous.as_ref().map(Rendered::nodes).unwrap_or_default();
        let items = self.flatten(items);
        if items.is_empty() {
            self.clear(container, Marker::EmptyList.payload(), &old)
        } else {
            self.reconcile_items(container, items, &old)
        }
    }

    /// Run `source` through `run` inside a tracked computation seeded with
    /// `previous`. A failing first run is returned and the slot stopped; a
    /// failing re-run is recorded and the slot keeps its last result.
    fn bind_slot<F>(
        &self,
        container: NodeId,
        source: Getter,
        previous: Option<Rendered>,
        run: F,
    ) -> Result<Rendered>
    where
        F: Fn(&Renderer<T>, View, Option<Rendered>) -> Result<Rendered> + 'static,
    {
        let weak = self.downgrade();
        let getter = source.clone();
        let started = Rc::new(Cell::new(false));
        let first_error: Rc<RefCell<Option<RenderError>>> = Rc::new(RefCell::new(None));

        let started_run = started.clone();
        let first_error_run = first_error.clone();
        let tracked = track(
            move |prev: Option<Rendered>| {
                let Some(renderer) = weak.upgrade() else {
                    return prev;
                };
                let value = getter();
                let fallback = prev.clone();
                match run(&renderer, value, prev) {
                    Ok(result) => Some(result),
                    Err(err) if started_run.get() => {
                        renderer.record_error(err);
                        fallback
                    }
                    Err(err) => {
                        *first_error_run.borrow_mut() = Some(err);
                        fallback
                    }
                }
            },
            previous,
        );
        started.set(true);

        let failed = first_error.borrow_mut().take();
        if let Some(err) = failed {
            tracked.stop();
            return Err(err);
        }
        debug!("patch {}: reactive slot bound", container);
        Ok(Rendered::Live(LiveSlot::new(source, tracked)))
    }
}

/// Whether a sequence reads reactive values while being flattened.
/// Element children do not count; they are patched on their own.
fn has_reactive_items(items: &[View]) -> bool {
    items.iter().any(|item| match item {
        View::Reactive(_) => true,
        View::Sequence(nested) => has_reactive_items(nested),
        _ => false,
    })
}

/// Stop a superseded slot and resolve it to the result it left in the tree.
fn settle(slot: LiveSlot) -> Option<Rendered> {
    let mut slot = slot;
    loop {
        slot.stop();
        match slot.current() {
            Some(Rendered::Live(inner)) => slot = inner,
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::primitives::element;
    use crate::tree::Document;
    use spark_signals::signal;

    fn setup() -> (Rc<Document>, Renderer<Document>) {
        let doc = Rc::new(Document::new());
        let renderer = Renderer::new(doc.clone(), RenderConfig::default());
        (doc, renderer)
    }

    #[test]
    fn test_text_then_text_updates_in_place() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let first = renderer.patch(root, "a", None).unwrap();
        let node = first.node().unwrap();
        doc.clear_mutations();

        let second = renderer.patch(root, "b", Some(first)).unwrap();
        assert_eq!(second.node(), Some(node), "same text node reused");
        assert_eq!(doc.text(node).as_deref(), Some("b"));
        assert_eq!(doc.counts().text_updates, 1);
        assert_eq!(doc.counts().structural(), 0);
    }

    #[test]
    fn test_same_text_is_free() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let first = renderer.patch(root, "same", None).unwrap();
        doc.clear_mutations();
        renderer.patch(root, "same", Some(first)).unwrap();
        assert_eq!(doc.counts().total(), 0);
    }

    #[test]
    fn test_empty_values_leave_markers() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let nothing = renderer.patch(root, (), None).unwrap();
        let marker = nothing.node().unwrap();
        assert!(doc.is_marker(marker));
        assert_eq!(doc.text(marker).as_deref(), Some("null"));

        let flag = renderer.patch(root, false, Some(nothing)).unwrap();
        assert_eq!(flag.node(), Some(marker), "marker is reused");
        assert_eq!(doc.text(marker).as_deref(), Some("false"));

        let list = renderer.patch(root, Vec::<View>::new(), Some(flag)).unwrap();
        assert_eq!(doc.text(list.node().unwrap()).as_deref(), Some("[]"));
        assert_eq!(doc.children(root).len(), 1);
    }

    #[test]
    fn test_text_replaces_element() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let el = renderer.patch(root, element("b").child("x"), None).unwrap();
        let old = el.node().unwrap();
        let text = renderer.patch(root, "plain", Some(el)).unwrap();
        assert_eq!(doc.children(root), vec![text.node().unwrap()]);
        assert_eq!(doc.parent(old), None);
        assert!(!renderer.is_tracked(old), "replaced element is released");
    }

    #[test]
    fn test_element_with_same_tag_is_updated() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let first = renderer.patch(root, element("a").attr("href", "/x"), None).unwrap();
        let node = first.node().unwrap();
        let second = renderer.patch(root, element("a").attr("href", "/y"), Some(first)).unwrap();
        assert_eq!(second.node(), Some(node));
        assert_eq!(doc.attribute(node, "href").as_deref(), Some("/y"));
    }

    #[test]
    fn test_element_with_other_tag_is_replaced() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let first = renderer.patch(root, element("a"), None).unwrap();
        let old = first.node().unwrap();
        let second = renderer.patch(root, element("b"), Some(first)).unwrap();
        assert_ne!(second.node(), Some(old));
        assert_eq!(doc.tag(second.node().unwrap()).as_deref(), Some("b"));
        assert_eq!(doc.children(root).len(), 1);
    }

    #[test]
    fn test_passthrough_node_identity() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let node = doc.create_element("span", crate::types::Namespace::Html);
        let first = renderer.patch(root, node, None).unwrap();
        doc.clear_mutations();
        let second = renderer.patch(root, node, Some(first.clone())).unwrap();
        assert_eq!(first, second);
        assert_eq!(doc.counts().total(), 0);
    }

    #[test]
    fn test_unknown_node_fails() {
        let (doc, renderer) = setup();
        let err = renderer.patch(doc.root(), NodeId(999), None).unwrap_err();
        assert_eq!(err, RenderError::UnknownNode(NodeId(999)));
    }

    #[test]
    fn test_detached_previous_fails() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let first = renderer.patch(root, "x", None).unwrap();
        let node = first.node().unwrap();
        doc.remove_child(root, node).unwrap();
        let err = renderer.patch(root, "y", Some(first)).unwrap_err();
        assert_eq!(err, RenderError::Detached { container: root, node });
    }

    #[test]
    fn test_invalid_tag_fails() {
        let (doc, renderer) = setup();
        let err = renderer.patch(doc.root(), element("two words"), None).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTag(_)));
    }

    #[test]
    fn test_default_tag_is_div() {
        let (doc, renderer) = setup();
        let result = renderer.patch(doc.root(), ElementSpec::new(None), None).unwrap();
        assert_eq!(doc.tag(result.node().unwrap()).as_deref(), Some("div"));
    }

    #[test]
    fn test_reactive_text_follows_signal() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let name = signal(String::from("Ada"));
        let n = name.clone();
        let slot = renderer
            .patch(root, View::reactive(move || format!("hi {}", n.get())), None)
            .unwrap();
        let node = slot.node().unwrap();
        assert_eq!(doc.text(node).as_deref(), Some("hi Ada"));

        name.set(String::from("Grace"));
        assert_eq!(doc.text(node).as_deref(), Some("hi Grace"));
        assert_eq!(slot.node(), Some(node), "text node reused across runs");
    }

    #[test]
    fn test_same_reactive_value_is_noop() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let view = View::reactive(|| "fixed");
        let first = renderer.patch(root, view.clone(), None).unwrap();
        doc.clear_mutations();
        let second = renderer.patch(root, view, Some(first.clone())).unwrap();
        assert_eq!(first, second);
        assert_eq!(doc.counts().total(), 0);
    }

    #[test]
    fn test_superseded_slot_stops() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let count = signal(0);
        let c = count.clone();
        let first = renderer
            .patch(root, View::reactive(move || c.get().to_string()), None)
            .unwrap();
        let node = first.node().unwrap();

        let second = renderer.patch(root, "static", Some(first.clone())).unwrap();
        assert_eq!(second.node(), Some(node), "text node carried over");
        count.set(5);
        assert_eq!(doc.text(node).as_deref(), Some("static"), "old slot no longer writes");
        match first {
            Rendered::Live(slot) => assert!(!slot.is_active()),
            other => panic!("expected a live slot, got {:?}", other),
        }
    }

    #[test]
    fn test_reactive_first_run_error_is_returned() {
        let (doc, renderer) = setup();
        let err = renderer
            .patch(doc.root(), View::reactive(|| NodeId(424242)), None)
            .unwrap_err();
        assert_eq!(err, RenderError::UnknownNode(NodeId(424242)));
    }

    #[test]
    fn test_reactive_rerun_error_is_recorded() {
        let (doc, renderer) = setup();
        let root = doc.root();
        let broken = signal(false);
        let b = broken.clone();
        let slot = renderer
            .patch(
                root,
                View::reactive(move || {
                    if b.get() {
                        View::Node(NodeId(424242))
                    } else {
                        View::from("ok")
                    }
                }),
                None,
            )
            .unwrap();
        let node = slot.node().unwrap();

        broken.set(true);
        assert_eq!(renderer.take_errors(), vec![RenderError::UnknownNode(NodeId(424242))]);
        assert_eq!(slot.node(), Some(node), "slot keeps its last result");
        assert_eq!(doc.text(node).as_deref(), Some("ok"));

        broken.set(false);
        assert_eq!(doc.children(root), vec![node]);
    }
}
