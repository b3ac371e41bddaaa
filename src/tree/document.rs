//! In-memory Document - Arena-backed target tree.
//!
//! Nodes live in a single arena and are addressed by index. Like the DOM,
//! nodes are never freed: a detached node stays valid and can be attached
//! again. Every mutation is appended to a log so callers (and tests) can
//! see exactly which operations a patch performed.
//!
//! # Example
//!
//! ```ignore
//! use spark_patch::tree::{Document, TargetTree};
//! use spark_patch::Namespace;
//!
//! let doc = Document::new();
//! let div = doc.create_element("div", Namespace::Html);
//! doc.append_child(doc.root(), div)?;
//! assert_eq!(doc.inner_html(doc.root()), "<div></div>");
//! ```

use std::cell::RefCell;

use indexmap::IndexMap;

use super::event::{Event, EventHandler, ListenerId};
use super::TargetTree;
use crate::error::TreeError;
use crate::serialize::{escape_text, is_void_element, kebab_case, push_attribute};
use crate::types::{Namespace, NodeId, NodeKind, Scalar};

// =============================================================================
// Mutation Log
// =============================================================================

/// One target-tree operation, as recorded by [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create { node: NodeId, kind: NodeKind },
    Append { parent: NodeId, child: NodeId },
    InsertBefore { parent: NodeId, child: NodeId, reference: NodeId },
    Replace { parent: NodeId, new_child: NodeId, old_child: NodeId },
    Remove { parent: NodeId, child: NodeId },
    SetText { node: NodeId, text: String },
    SetAttribute { node: NodeId, name: String, value: String },
    RemoveAttribute { node: NodeId, name: String },
    SetProperty { node: NodeId, name: String, value: Scalar },
    SetStyle { node: NodeId, name: String, value: Option<String> },
    SetClassName { node: NodeId, value: String },
    ToggleClass { node: NodeId, class: String, on: bool },
    AddListener { node: NodeId, event: String },
    RemoveListener { node: NodeId },
}

/// Aggregated view of a mutation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationCounts {
    pub creates: usize,
    /// Appends and insert-befores (moves included).
    pub inserts: usize,
    pub replaces: usize,
    pub removes: usize,
    pub text_updates: usize,
    pub attributes: usize,
    pub properties: usize,
    pub styles: usize,
    pub classes: usize,
    pub listeners: usize,
}

impl MutationCounts {
    /// Operations that change the shape of the tree.
    pub fn structural(&self) -> usize {
        self.inserts + self.replaces + self.removes
    }

    /// Every recorded operation except node creation.
    pub fn total(&self) -> usize {
        self.structural()
            + self.text_updates
            + self.attributes
            + self.properties
            + self.styles
            + self.classes
            + self.listeners
    }

    fn record(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::Create { .. } => self.creates += 1,
            Mutation::Append { .. } | Mutation::InsertBefore { .. } => self.inserts += 1,
            Mutation::Replace { .. } => self.replaces += 1,
            Mutation::Remove { .. } => self.removes += 1,
            Mutation::SetText { .. } => self.text_updates += 1,
            Mutation::SetAttribute { .. } | Mutation::RemoveAttribute { .. } => self.attributes += 1,
            Mutation::SetProperty { .. } => self.properties += 1,
            Mutation::SetStyle { .. } => self.styles += 1,
            Mutation::SetClassName { .. } | Mutation::ToggleClass { .. } => self.classes += 1,
            Mutation::AddListener { .. } | Mutation::RemoveListener { .. } => self.listeners += 1,
        }
    }
}

// =============================================================================
// Node Storage
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct AttributeName {
    namespace: Option<String>,
    name: String,
}

struct NodeData {
    kind: NodeKind,
    tag: Option<String>,
    namespace: Namespace,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: IndexMap<AttributeName, String>,
    properties: IndexMap<String, Scalar>,
    style: IndexMap<String, String>,
    classes: Vec<String>,
    listeners: Vec<(ListenerId, String, EventHandler)>,
}

impl NodeData {
    fn new(kind: NodeKind, tag: Option<String>, namespace: Namespace, text: String) -> Self {
        Self {
            kind,
            tag,
            namespace,
            text,
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
            style: IndexMap::new(),
            classes: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

struct DocumentState {
    nodes: Vec<NodeData>,
    root: NodeId,
    root_listeners: Vec<(ListenerId, String, EventHandler)>,
    next_listener: usize,
    log: Vec<Mutation>,
}

impl DocumentState {
    fn node(&self, id: NodeId) -> Result<&NodeData, TreeError> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, TreeError> {
        self.nodes.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        let kind = data.kind;
        self.nodes.push(data);
        self.log.push(Mutation::Create { node: id, kind });
        id
    }

    fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    /// Validate that `child` may be placed under `parent`.
    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.node(parent)?.kind.is_container() {
            return Err(TreeError::NotAContainer(parent));
        }
        self.node(child)?;
        // child must not be parent or one of its ancestors
        let mut current = Some(parent);
        while let Some(node) = current {
            if node == child {
                return Err(TreeError::Cycle { parent, child });
            }
            current = self.node(node)?.parent;
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId) -> Result<(), TreeError> {
        if let Some(parent) = self.node(child)?.parent {
            let siblings = &mut self.node_mut(parent)?.children;
            siblings.retain(|&c| c != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
        self.node(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })
    }

    fn is_attached_to_root(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.nodes.get(id.0).and_then(|n| n.parent);
        }
        false
    }
}

// =============================================================================
// Document
// =============================================================================

/// In-memory target tree with a mutation log and event dispatch.
pub struct Document {
    state: RefCell<DocumentState>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an empty `body` root element.
    pub fn new() -> Self {
        let root_data = NodeData::new(NodeKind::Element, Some("body".into()), Namespace::Html, String::new());
        Self {
            state: RefCell::new(DocumentState {
                nodes: vec![root_data],
                root: NodeId(0),
                root_listeners: Vec::new(),
                next_listener: 0,
                log: Vec::new(),
            }),
        }
    }

    /// The stable root container; root listeners observe events bubbling out of it.
    pub fn root(&self) -> NodeId {
        self.state.borrow().root
    }

    // -------------------------------------------------------------------------
    // Mutation log
    // -------------------------------------------------------------------------

    /// Every mutation recorded since creation or the last [`clear_mutations`](Self::clear_mutations).
    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.borrow().log.clone()
    }

    /// Counts of the recorded mutations.
    pub fn counts(&self) -> MutationCounts {
        let mut counts = MutationCounts::default();
        for mutation in &self.state.borrow().log {
            counts.record(mutation);
        }
        counts
    }

    pub fn clear_mutations(&self) {
        self.state.borrow_mut().log.clear();
    }

    fn record(&self, mutation: Mutation) {
        self.state.borrow_mut().log.push(mutation);
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let state = self.state.borrow();
        let data = state.node(node).ok()?;
        data.attributes
            .get(&AttributeName { namespace: None, name: name.to_string() })
            .cloned()
    }

    pub fn attribute_ns(&self, node: NodeId, namespace: &str, name: &str) -> Option<String> {
        let state = self.state.borrow();
        let data = state.node(node).ok()?;
        data.attributes
            .get(&AttributeName { namespace: Some(namespace.to_string()), name: name.to_string() })
            .cloned()
    }

    pub fn property(&self, node: NodeId, name: &str) -> Option<Scalar> {
        let state = self.state.borrow();
        state.node(node).ok()?.properties.get(name).cloned()
    }

    pub fn style(&self, node: NodeId, name: &str) -> Option<String> {
        let state = self.state.borrow();
        state.node(node).ok()?.style.get(name).cloned()
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        let state = self.state.borrow();
        state.node(node).map(|n| n.classes.clone()).unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).iter().any(|c| c == class)
    }

    /// Number of listeners attached directly on `node`.
    pub fn listener_count(&self, node: NodeId) -> usize {
        let state = self.state.borrow();
        state.node(node).map(|n| n.listeners.len()).unwrap_or(0)
    }

    /// Number of listeners attached at the root.
    pub fn root_listener_count(&self) -> usize {
        self.state.borrow().root_listeners.len()
    }

    // -------------------------------------------------------------------------
    // Event dispatch
    // -------------------------------------------------------------------------

    /// Dispatch `event` at `target`.
    ///
    /// Direct listeners run from the target up through its ancestors (only
    /// the target for non-bubbling events). Root listeners run last, and only
    /// for bubbling events whose target is attached under the root.
    /// `stop_propagation` ends the walk.
    pub fn dispatch_event(&self, target: NodeId, event: &Event) -> Result<(), TreeError> {
        let path = {
            let state = self.state.borrow();
            state.node(target)?;
            let mut path = vec![target];
            if event.bubbles() {
                let mut current = state.node(target)?.parent;
                while let Some(node) = current {
                    path.push(node);
                    current = state.node(node)?.parent;
                }
            }
            path
        };
        event.set_target(Some(target));

        for node in path {
            // Clone handlers out so no borrow is held while user code runs.
            let handlers: Vec<EventHandler> = {
                let state = self.state.borrow();
                state
                    .node(node)?
                    .listeners
                    .iter()
                    .filter(|(_, name, _)| name == event.name())
                    .map(|(_, _, handler)| handler.clone())
                    .collect()
            };
            event.set_current_target(Some(node));
            for handler in handlers {
                handler(event);
            }
            if event.is_propagation_stopped() {
                event.set_current_target(None);
                return Ok(());
            }
        }

        let root_handlers: Vec<EventHandler> = {
            let state = self.state.borrow();
            if !event.bubbles() || !state.is_attached_to_root(target) {
                Vec::new()
            } else {
                state
                    .root_listeners
                    .iter()
                    .filter(|(_, name, _)| name == event.name())
                    .map(|(_, _, handler)| handler.clone())
                    .collect()
            }
        };
        event.set_current_target(None);
        for handler in root_handlers {
            handler(event);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Serialisation
    // -------------------------------------------------------------------------

    /// HTML of `node` itself.
    pub fn outer_html(&self, node: NodeId) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        write_node(&state, node, &mut out);
        out
    }

    /// HTML of `node`'s children.
    pub fn inner_html(&self, node: NodeId) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        if let Ok(data) = state.node(node) {
            for &child in &data.children {
                write_node(&state, child, &mut out);
            }
        }
        out
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        collect_text(&state, node, &mut out);
        out
    }
}

fn collect_text(state: &DocumentState, node: NodeId, out: &mut String) {
    let Ok(data) = state.node(node) else { return };
    match data.kind {
        NodeKind::Text => out.push_str(&data.text),
        NodeKind::Marker => {}
        NodeKind::Element => {
            for &child in &data.children {
                collect_text(state, child, out);
            }
        }
    }
}

fn write_node(state: &DocumentState, node: NodeId, out: &mut String) {
    let Ok(data) = state.node(node) else { return };
    match data.kind {
        NodeKind::Text => out.push_str(&escape_text(&data.text)),
        NodeKind::Marker => {
            out.push_str("<!--");
            out.push_str(&data.text);
            out.push_str("-->");
        }
        NodeKind::Element => {
            let tag = data.tag.as_deref().unwrap_or("div");
            out.push('<');
            out.push_str(tag);
            for (key, value) in &data.attributes {
                if key.namespace.is_none() && (key.name == "class" || key.name == "style") {
                    continue;
                }
                push_attribute(out, &key.name, value);
            }
            let class_attr = AttributeName { namespace: None, name: "class".into() };
            if !data.classes.is_empty() {
                push_attribute(out, "class", &data.classes.join(" "));
            } else if let Some(class) = data.attributes.get(&class_attr) {
                push_attribute(out, "class", class);
            }
            let style_attr = AttributeName { namespace: None, name: "style".into() };
            if !data.style.is_empty() {
                let style: Vec<String> = data
                    .style
                    .iter()
                    .map(|(name, value)| {
                        let name = if name.starts_with('-') { name.clone() } else { kebab_case(name) };
                        format!("{}: {};", name, value)
                    })
                    .collect();
                push_attribute(out, "style", &style.join(" "));
            } else if let Some(style) = data.attributes.get(&style_attr) {
                push_attribute(out, "style", style);
            }

            if data.children.is_empty() && is_void_element(tag) {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in &data.children {
                write_node(state, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

// =============================================================================
// TargetTree
// =============================================================================

impl TargetTree for Document {
    fn create_element(&self, tag: &str, namespace: Namespace) -> NodeId {
        let data = NodeData::new(NodeKind::Element, Some(tag.to_string()), namespace, String::new());
        self.state.borrow_mut().alloc(data)
    }

    fn create_text(&self, text: &str) -> NodeId {
        let data = NodeData::new(NodeKind::Text, None, Namespace::Html, text.to_string());
        self.state.borrow_mut().alloc(data)
    }

    fn create_marker(&self, payload: &str) -> NodeId {
        let data = NodeData::new(NodeKind::Marker, None, Namespace::Html, payload.to_string());
        self.state.borrow_mut().alloc(data)
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        state.check_insertable(parent, child)?;
        state.detach(child)?;
        state.node_mut(parent)?.children.push(child);
        state.node_mut(child)?.parent = Some(parent);
        state.log.push(Mutation::Append { parent, child });
        Ok(())
    }

    fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), TreeError> {
        let Some(reference) = reference else {
            return self.append_child(parent, child);
        };
        let mut state = self.state.borrow_mut();
        state.check_insertable(parent, child)?;
        state.position(parent, reference)?;
        if child == reference {
            return Ok(());
        }
        state.detach(child)?;
        let index = state.position(parent, reference)?;
        state.node_mut(parent)?.children.insert(index, child);
        state.node_mut(child)?.parent = Some(parent);
        state.log.push(Mutation::InsertBefore { parent, child, reference });
        Ok(())
    }

    fn replace_child(
        &self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        state.check_insertable(parent, new_child)?;
        state.position(parent, old_child)?;
        if new_child == old_child {
            return Ok(());
        }
        state.detach(new_child)?;
        let index = state.position(parent, old_child)?;
        state.node_mut(parent)?.children[index] = new_child;
        state.node_mut(new_child)?.parent = Some(parent);
        state.node_mut(old_child)?.parent = None;
        state.log.push(Mutation::Replace { parent, new_child, old_child });
        Ok(())
    }

    fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        let index = state.position(parent, child)?;
        state.node_mut(parent)?.children.remove(index);
        state.node_mut(child)?.parent = None;
        state.log.push(Mutation::Remove { parent, child });
        Ok(())
    }

    fn set_text(&self, node: NodeId, text: &str) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        let data = state.node_mut(node)?;
        if data.kind.is_container() {
            return Err(TreeError::NotAContainer(node));
        }
        data.text = text.to_string();
        state.log.push(Mutation::SetText { node, text: text.to_string() });
        Ok(())
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        state
            .node_mut(node)?
            .attributes
            .insert(AttributeName { namespace: None, name: name.to_string() }, value.to_string());
        state.log.push(Mutation::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        state
            .node_mut(node)?
            .attributes
            .shift_remove(&AttributeName { namespace: None, name: name.to_string() });
        state.log.push(Mutation::RemoveAttribute { node, name: name.to_string() });
        Ok(())
    }

    fn set_attribute_ns(
        &self,
        node: NodeId,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        let key = AttributeName { namespace: Some(namespace.to_string()), name: name.to_string() };
        state.node_mut(node)?.attributes.insert(key, value.to_string());
        state.log.push(Mutation::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute_ns(
        &self,
        node: NodeId,
        namespace: &str,
        name: &str,
    ) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        let key = AttributeName { namespace: Some(namespace.to_string()), name: name.to_string() };
        state.node_mut(node)?.attributes.shift_remove(&key);
        state.log.push(Mutation::RemoveAttribute { node, name: name.to_string() });
        Ok(())
    }

    fn set_property(&self, node: NodeId, name: &str, value: &Scalar) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        state.node_mut(node)?.properties.insert(name.to_string(), value.clone());
        state.log.push(Mutation::SetProperty { node, name: name.to_string(), value: value.clone() });
        Ok(())
    }

    fn set_style(&self, node: NodeId, name: &str, value: Option<&str>) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        let style = &mut state.node_mut(node)?.style;
        match value {
            Some(v) if !v.is_empty() => {
                style.insert(name.to_string(), v.to_string());
            }
            _ => {
                style.shift_remove(name);
            }
        }
        state.log.push(Mutation::SetStyle {
            node,
            name: name.to_string(),
            value: value.map(str::to_string),
        });
        Ok(())
    }

    fn set_class_name(&self, node: NodeId, value: &str) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        let data = state.node_mut(node)?;
        data.classes.clear();
        for class in value.split_whitespace() {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_string());
            }
        }
        state.log.push(Mutation::SetClassName { node, value: value.to_string() });
        Ok(())
    }

    fn toggle_class(&self, node: NodeId, class: &str, on: bool) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        let classes = &mut state.node_mut(node)?.classes;
        let present = classes.iter().any(|c| c == class);
        if on && !present {
            classes.push(class.to_string());
        } else if !on && present {
            classes.retain(|c| c != class);
        }
        state.log.push(Mutation::ToggleClass { node, class: class.to_string(), on });
        Ok(())
    }

    fn add_listener(
        &self,
        node: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<ListenerId, TreeError> {
        let mut state = self.state.borrow_mut();
        state.node(node)?;
        let id = state.next_listener_id();
        state.node_mut(node)?.listeners.push((id, event.to_string(), handler));
        state.log.push(Mutation::AddListener { node, event: event.to_string() });
        Ok(id)
    }

    fn remove_listener(&self, node: NodeId, id: ListenerId) -> Result<(), TreeError> {
        let mut state = self.state.borrow_mut();
        state.node_mut(node)?.listeners.retain(|(listener, _, _)| *listener != id);
        state.log.push(Mutation::RemoveListener { node });
        Ok(())
    }

    fn add_root_listener(&self, event: &str, handler: EventHandler) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_listener_id();
        state.root_listeners.push((id, event.to_string(), handler));
        id
    }

    fn remove_root_listener(&self, id: ListenerId) {
        let mut state = self.state.borrow_mut();
        state.root_listeners.retain(|(listener, _, _)| *listener != id);
    }

    fn contains(&self, node: NodeId) -> bool {
        node.0 < self.state.borrow().nodes.len()
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.state.borrow().node(node).ok().map(|n| n.kind)
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        self.state.borrow().node(node).ok().and_then(|n| n.tag.clone())
    }

    fn namespace(&self, node: NodeId) -> Option<Namespace> {
        self.state.borrow().node(node).ok().map(|n| n.namespace)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().node(node).ok().and_then(|n| n.parent)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let state = self.state.borrow();
        let parent = state.node(node).ok()?.parent?;
        let siblings = &state.node(parent).ok()?.children;
        let index = siblings.iter().position(|&c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state.borrow().node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn text(&self, node: NodeId) -> Option<String> {
        let state = self.state.borrow();
        let data = state.node(node).ok()?;
        (!data.kind.is_container()).then(|| data.text.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn div(doc: &Document) -> NodeId {
        doc.create_element("div", Namespace::Html)
    }

    #[test]
    fn test_append_and_serialize() {
        let doc = Document::new();
        let root = doc.root();
        let a = div(&doc);
        let t = doc.create_text("hi <there>");
        doc.append_child(root, a).unwrap();
        doc.append_child(a, t).unwrap();
        doc.set_attribute(a, "id", "main").unwrap();

        assert_eq!(doc.inner_html(root), "<div id=\"main\">hi &lt;there&gt;</div>");
        assert_eq!(doc.text_content(root), "hi <there>");
    }

    #[test]
    fn test_insert_before_moves_node() {
        let doc = Document::new();
        let root = doc.root();
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        let c = doc.create_text("c");
        for n in [a, b, c] {
            doc.append_child(root, n).unwrap();
        }

        doc.insert_before(root, c, Some(a)).unwrap();
        assert_eq!(doc.children(root), vec![c, a, b]);
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.next_sibling(b), None);
    }

    #[test]
    fn test_replace_child_detaches_old() {
        let doc = Document::new();
        let root = doc.root();
        let a = div(&doc);
        let b = div(&doc);
        doc.append_child(root, a).unwrap();
        doc.replace_child(root, b, a).unwrap();

        assert_eq!(doc.children(root), vec![b]);
        assert_eq!(doc.parent(a), None);
        assert_eq!(doc.parent(b), Some(root));
    }

    #[test]
    fn test_errors() {
        let doc = Document::new();
        let root = doc.root();
        let a = div(&doc);
        let t = doc.create_text("x");

        assert_eq!(
            doc.remove_child(root, a),
            Err(TreeError::NotAChild { parent: root, child: a })
        );
        assert_eq!(doc.append_child(t, a), Err(TreeError::NotAContainer(t)));
        doc.append_child(root, a).unwrap();
        assert_eq!(doc.append_child(a, root), Err(TreeError::Cycle { parent: a, child: root }));
        assert_eq!(doc.append_child(root, NodeId(99)), Err(TreeError::UnknownNode(NodeId(99))));
    }

    #[test]
    fn test_mutation_counts() {
        let doc = Document::new();
        let root = doc.root();
        let a = doc.create_text("a");
        doc.append_child(root, a).unwrap();
        doc.set_text(a, "b").unwrap();
        doc.remove_child(root, a).unwrap();

        let counts = doc.counts();
        assert_eq!(counts.creates, 1);
        assert_eq!(counts.inserts, 1);
        assert_eq!(counts.text_updates, 1);
        assert_eq!(counts.removes, 1);
        assert_eq!(counts.structural(), 2);

        doc.clear_mutations();
        assert_eq!(doc.counts(), MutationCounts::default());
    }

    #[test]
    fn test_classes_and_style() {
        let doc = Document::new();
        let a = div(&doc);
        doc.set_class_name(a, "x y x").unwrap();
        assert_eq!(doc.classes(a), vec!["x".to_string(), "y".to_string()]);
        doc.toggle_class(a, "y", false).unwrap();
        doc.toggle_class(a, "z", true).unwrap();
        assert_eq!(doc.classes(a), vec!["x".to_string(), "z".to_string()]);

        doc.set_style(a, "fontSize", Some("12px")).unwrap();
        doc.set_style(a, "--gap", Some("4px")).unwrap();
        assert_eq!(
            doc.outer_html(a),
            "<div class=\"x z\" style=\"font-size: 12px; --gap: 4px;\"></div>"
        );
        doc.set_style(a, "fontSize", None).unwrap();
        assert_eq!(doc.style(a, "fontSize"), None);
    }

    #[test]
    fn test_dispatch_bubbles_and_stops() {
        let doc = Document::new();
        let root = doc.root();
        let outer = div(&doc);
        let inner = div(&doc);
        doc.append_child(root, outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s1 = seen.clone();
        doc.add_listener(inner, "click", Rc::new(move |_e: &Event| s1.borrow_mut().push("inner")))
            .unwrap();
        let s2 = seen.clone();
        doc.add_listener(outer, "click", Rc::new(move |e: &Event| {
            s2.borrow_mut().push("outer");
            e.stop_propagation();
        }))
        .unwrap();
        let s3 = seen.clone();
        doc.add_root_listener("click", Rc::new(move |_e: &Event| s3.borrow_mut().push("root")));

        doc.dispatch_event(inner, &Event::new("click")).unwrap();
        assert_eq!(*seen.borrow(), vec!["inner", "outer"]);
    }

    #[test]
    fn test_root_listener_skips_detached_and_non_bubbling() {
        let doc = Document::new();
        let detached = div(&doc);
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        doc.add_root_listener("click", Rc::new(move |_e: &Event| *c.borrow_mut() += 1));
        let c = count.clone();
        doc.add_root_listener("focus", Rc::new(move |_e: &Event| *c.borrow_mut() += 1));

        doc.dispatch_event(detached, &Event::new("click")).unwrap();
        assert_eq!(*count.borrow(), 0);

        let attached = div(&doc);
        doc.append_child(doc.root(), attached).unwrap();
        doc.dispatch_event(attached, &Event::new("focus")).unwrap();
        assert_eq!(*count.borrow(), 0);
        doc.dispatch_event(attached, &Event::new("click")).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_void_elements_self_close() {
        let doc = Document::new();
        let input = doc.create_element("input", Namespace::Html);
        doc.set_attribute(input, "type", "text").unwrap();
        assert_eq!(doc.outer_html(input), "<input type=\"text\"/>");

        let marker = doc.create_marker("null");
        assert_eq!(doc.outer_html(marker), "<!--null-->");
    }
}
