//! Per-node memory of what the renderer applied.
//!
//! Every element the renderer materialises gets a [`NodeRecord`]: the last
//! applied property set (so the next assignment only touches what changed)
//! and the previous result of its child region.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use super::rendered::Rendered;
use crate::error::TreeError;
use crate::primitives::Cleanup;
use crate::tree::{EventHandler, ListenerId, TargetTree};
use crate::types::{NodeId, Scalar};

// =============================================================================
// Targets
// =============================================================================

/// Where a flat value lands on a node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Target {
    Attribute(String),
    AttributeNs { uri: String, name: String },
    Property(String),
    Style(String),
    ClassName,
    /// One or more space-separated classes toggled together.
    ClassToggle(String),
}

impl Target {
    /// Write `value` to the node.
    pub(crate) fn write<T: TargetTree + ?Sized>(
        &self,
        tree: &T,
        node: NodeId,
        value: &Scalar,
    ) -> Result<(), TreeError> {
        match self {
            Target::Attribute(name) => match value.attribute_text() {
                Some(text) => tree.set_attribute(node, name, &text),
                None => tree.remove_attribute(node, name),
            },
            Target::AttributeNs { uri, name } => match value.attribute_text() {
                Some(text) => tree.set_attribute_ns(node, uri, name, &text),
                None => tree.remove_attribute_ns(node, uri, name),
            },
            Target::Property(name) => tree.set_property(node, name, value),
            Target::Style(name) => {
                let text = value.to_text();
                if text.is_empty() {
                    tree.set_style(node, name, None)
                } else {
                    tree.set_style(node, name, Some(&text))
                }
            }
            Target::ClassName => tree.set_class_name(node, &value.to_text()),
            Target::ClassToggle(group) => {
                let on = matches!(value, Scalar::Bool(true));
                for class in group.split_whitespace() {
                    tree.toggle_class(node, class, on)?;
                }
                Ok(())
            }
        }
    }

    /// Undo whatever `last` put on the node.
    pub(crate) fn clear<T: TargetTree + ?Sized>(
        &self,
        tree: &T,
        node: NodeId,
        last: Option<&Scalar>,
    ) -> Result<(), TreeError> {
        match self {
            Target::Attribute(name) => tree.remove_attribute(node, name),
            Target::AttributeNs { uri, name } => tree.remove_attribute_ns(node, uri, name),
            Target::Property(name) => tree.set_property(node, name, &Scalar::Null),
            Target::Style(name) => tree.set_style(node, name, None),
            Target::ClassName => tree.set_class_name(node, ""),
            Target::ClassToggle(_) => {
                if matches!(last, Some(Scalar::Bool(true))) {
                    self.write(tree, node, &Scalar::Bool(false))
                } else {
                    Ok(())
                }
            }
        }
    }
}

// =============================================================================
// Applied values
// =============================================================================

/// Stops a reactive binding when dropped.
pub(crate) struct Binding(Option<Cleanup>);

impl Binding {
    pub(crate) fn new(stop: Cleanup) -> Self {
        Self(Some(stop))
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        if let Some(stop) = self.0.take() {
            stop();
        }
    }
}

/// Last value written for one target, plus the binding keeping it fresh.
pub(crate) struct Applied {
    /// Shared with the binding, which updates it on every write.
    pub(crate) last: Rc<RefCell<Option<Scalar>>>,
    pub(crate) binding: Option<Binding>,
}

impl Applied {
    pub(crate) fn fixed(value: Scalar) -> Self {
        Self {
            last: Rc::new(RefCell::new(Some(value))),
            binding: None,
        }
    }

    pub(crate) fn last(&self) -> Option<Scalar> {
        self.last.borrow().clone()
    }

    /// Whether this entry holds exactly `value` with no binding attached.
    pub(crate) fn is_fixed_to(&self, value: &Scalar) -> bool {
        self.binding.is_none() && self.last.borrow().as_ref() == Some(value)
    }
}

// =============================================================================
// Records
// =============================================================================

/// What one prop key left on the node.
pub(crate) enum Entry {
    Value { target: Target, applied: Applied },
    StyleMap(IndexMap<String, Applied>),
    ClassToggles(IndexMap<String, Applied>),
    Handler {
        event: String,
        handler: EventHandler,
        /// Direct listener; `None` when the handler sits in a delegation slot.
        listener: Option<ListenerId>,
    },
    Ref,
    /// `oninsert`: run each time the renderer attaches the node to a parent.
    InsertHook(EventHandler),
}

impl Entry {
    /// Move the reactive bindings out of this entry, keeping the values.
    pub(crate) fn take_bindings(&mut self, out: &mut Vec<Binding>) {
        match self {
            Entry::Value { applied, .. } => out.extend(applied.binding.take()),
            Entry::StyleMap(map) | Entry::ClassToggles(map) => {
                out.extend(map.values_mut().filter_map(|applied| applied.binding.take()));
            }
            Entry::Handler { .. } | Entry::Ref | Entry::InsertHook(_) => {}
        }
    }
}

/// Per-node memory of the last applied property set.
#[derive(Default)]
pub(crate) struct PropertyRecord {
    pub(crate) entries: IndexMap<String, Entry>,
}

impl PropertyRecord {
    pub(crate) fn insert_hook(&self) -> Option<EventHandler> {
        self.entries.values().find_map(|entry| match entry {
            Entry::InsertHook(hook) => Some(hook.clone()),
            _ => None,
        })
    }
}

/// Everything the renderer remembers about one element.
#[derive(Default)]
pub(crate) struct NodeRecord {
    pub(crate) props: PropertyRecord,
    /// Previous result of the element's child region.
    pub(crate) children: Option<Rendered>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Document;
    use crate::types::Namespace;
    use std::cell::Cell;

    #[test]
    fn test_binding_stops_on_drop() {
        let stopped = Rc::new(Cell::new(false));
        let s = stopped.clone();
        let binding = Binding::new(Box::new(move || s.set(true)));
        assert!(!stopped.get());
        drop(binding);
        assert!(stopped.get(), "dropping a binding should stop it");
    }

    #[test]
    fn test_attribute_target_removes_on_false() {
        let doc = Document::new();
        let node = doc.create_element("input", Namespace::Html);
        let target = Target::Attribute("disabled".into());

        target.write(&doc, node, &Scalar::Bool(true)).unwrap();
        assert_eq!(doc.attribute(node, "disabled"), Some(String::new()));
        target.write(&doc, node, &Scalar::Bool(false)).unwrap();
        assert_eq!(doc.attribute(node, "disabled"), None);
    }

    #[test]
    fn test_class_toggle_group() {
        let doc = Document::new();
        let node = doc.create_element("div", Namespace::Html);
        let target = Target::ClassToggle("a b".into());

        target.write(&doc, node, &Scalar::Bool(true)).unwrap();
        assert!(doc.has_class(node, "a") && doc.has_class(node, "b"));
        target.clear(&doc, node, Some(&Scalar::Bool(true))).unwrap();
        assert!(doc.classes(node).is_empty());
    }

    #[test]
    fn test_applied_fixed() {
        let applied = Applied::fixed(Scalar::from("x"));
        assert!(applied.is_fixed_to(&Scalar::from("x")));
        assert!(!applied.is_fixed_to(&Scalar::from("y")));
    }
}
