//! Property assignment - Materialise elements and diff their props.
//!
//! Each key of a prop mapping is routed to one kind of write:
//!
//! - `style` map: one style entry per key, each diffed on its own
//! - `style` text: the `style` attribute
//! - `classList` / `class` / `className`: whole class name, or per-group toggles
//! - `ref`: callback invoked once with the node
//! - `on*` handler: delegated slot or direct listener
//! - `prefix:name` with a known prefix: namespaced attribute
//! - known property name (HTML namespace only): property write
//! - anything else: attribute (`null`/`false` remove, `true` sets `""`)
//!
//! Assignment is differential: keys that disappeared are cleared, static
//! values equal to the last applied one are skipped, and reactive values
//! get a binding of their own that re-applies only that key.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{trace, warn};

use super::record::{Applied, Binding, Entry, PropertyRecord, Target};
use super::Renderer;
use crate::error::{RenderError, Result, TreeError};
use crate::events::event_name;
use crate::primitives::{ClassProp, Cleanup, ElementSpec, Prop, PropValue, StyleProp};
use crate::reactive::root_effect;
use crate::tree::{EventHandler, TargetTree};
use crate::types::{Namespace, NodeId, Scalar};

impl<T: TargetTree + 'static> Renderer<T> {
    // =========================================================================
    // Materialise / update
    // =========================================================================

    /// Create a detached element for `spec`, with props and children applied.
    pub fn materialize(&self, spec: ElementSpec) -> Result<NodeId> {
        self.materialize_in(None, spec)
    }

    /// Create an element for `spec` that will live under `parent`, which
    /// decides its namespace.
    pub(crate) fn materialize_in(&self, parent: Option<NodeId>, spec: ElementSpec) -> Result<NodeId> {
        let tree = self.tree();
        let tag = self.tag_for(&spec)?;
        let namespace = match parent {
            Some(p) => Namespace::for_child(
                tree.namespace(p).unwrap_or(Namespace::Html),
                tree.tag(p).as_deref(),
                &tag,
            ),
            None => Namespace::for_child(Namespace::Html, None, &tag),
        };

        let node = tree.create_element(&tag, namespace);
        trace!("materialize <{}> as {} ({:?})", tag, node, namespace);
        self.put_record(node, Default::default());

        self.assign(node, &spec.props)?;
        if let Some(children) = spec.children {
            let result = self.patch_view(node, *children, None)?;
            self.store_children(node, Some(result));
        }
        Ok(node)
    }

    /// Bring an existing element in line with `spec`: differential props,
    /// then its child region patched against the previous children.
    pub fn update(&self, node: NodeId, spec: ElementSpec) -> Result<()> {
        self.assign(node, &spec.props)?;

        let previous = self.take_children(node);
        match spec.children {
            Some(children) => {
                let result = self.patch_view(node, *children, previous)?;
                self.store_children(node, Some(result));
            }
            None => {
                if let Some(previous) = previous {
                    super::stop_slots(&previous);
                    self.discard(node, &previous.nodes())?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Assign
    // =========================================================================

    /// Apply `props` to `node`, touching only what changed since the last
    /// assignment to the same node.
    pub fn assign(&self, node: NodeId, props: &IndexMap<String, Prop>) -> Result<()> {
        let tree = self.tree();
        if !tree.contains(node) {
            return Err(RenderError::UnknownNode(node));
        }
        if !tree.is_element(node) {
            return Err(TreeError::NotAContainer(node).into());
        }

        let mut record = self.take_record(node);
        let result = self.assign_into(node, props, &mut record.props);
        self.put_record(node, record);
        result
    }

    fn assign_into(
        &self,
        node: NodeId,
        props: &IndexMap<String, Prop>,
        record: &mut PropertyRecord,
    ) -> Result<()> {
        let mut old = std::mem::take(&mut record.entries);

        let removed: Vec<String> = old
            .keys()
            .filter(|key| !props.contains_key(*key))
            .cloned()
            .collect();
        for key in removed {
            if let Some(entry) = old.shift_remove(&key) {
                trace!("{}: clear {:?}", node, key);
                self.clear_entry(node, &key, entry)?;
            }
        }

        for (key, prop) in props {
            let previous = old.shift_remove(key);
            if let Some(entry) = self.apply_prop(node, key, prop, previous)? {
                record.entries.insert(key.clone(), entry);
            }
        }
        Ok(())
    }

    fn apply_prop(
        &self,
        node: NodeId,
        key: &str,
        prop: &Prop,
        previous: Option<Entry>,
    ) -> Result<Option<Entry>> {
        match prop {
            Prop::Value(value) => {
                let target = self.route(node, key);
                self.apply_value_entry(node, key, target, value, previous)
            }
            Prop::Style(StyleProp::Text(text)) => {
                let target = Target::Attribute("style".to_string());
                self.apply_value_entry(node, key, target, &text.to_scalar(), previous)
            }
            Prop::Style(StyleProp::Map(values)) => {
                let old = match previous {
                    Some(Entry::StyleMap(map)) => map,
                    other => {
                        self.clear_previous(node, key, other)?;
                        IndexMap::new()
                    }
                };
                let applied = self.apply_map(node, values, old, |name| Target::Style(name.to_string()))?;
                Ok(Some(Entry::StyleMap(applied)))
            }
            Prop::Classes(ClassProp::Name(name)) => {
                self.apply_value_entry(node, key, Target::ClassName, &name.to_scalar(), previous)
            }
            Prop::Classes(ClassProp::Toggles(groups)) => {
                let old = match previous {
                    Some(Entry::ClassToggles(map)) => map,
                    other => {
                        self.clear_previous(node, key, other)?;
                        IndexMap::new()
                    }
                };
                let values: IndexMap<String, PropValue<Scalar>> = groups
                    .iter()
                    .map(|(group, on)| (group.clone(), on.to_scalar()))
                    .collect();
                let applied =
                    self.apply_map(node, &values, old, |group| Target::ClassToggle(group.to_string()))?;
                Ok(Some(Entry::ClassToggles(applied)))
            }
            Prop::Ref(callback) => {
                match previous {
                    Some(Entry::Ref) => {}
                    other => {
                        self.clear_previous(node, key, other)?;
                        callback(node);
                    }
                }
                Ok(Some(Entry::Ref))
            }
            Prop::Handler(handler) => self.apply_handler(node, key, handler, previous),
        }
    }

    /// Where a flat value under `key` lands on `node`.
    fn route(&self, node: NodeId, key: &str) -> Target {
        if key == "class" || key == "className" {
            return Target::ClassName;
        }
        if key.contains(':') {
            return match self.config().namespace_for(key) {
                Some(uri) => Target::AttributeNs {
                    uri: uri.to_string(),
                    name: key.to_string(),
                },
                None => Target::Attribute(key.to_string()),
            };
        }
        let namespace = self.tree().namespace(node).unwrap_or(Namespace::Html);
        if self.config().is_property(namespace, key) {
            Target::Property(key.to_string())
        } else {
            Target::Attribute(key.to_string())
        }
    }

    fn apply_value_entry(
        &self,
        node: NodeId,
        key: &str,
        target: Target,
        value: &PropValue<Scalar>,
        previous: Option<Entry>,
    ) -> Result<Option<Entry>> {
        let old = match previous {
            Some(Entry::Value { target: old_target, applied }) if old_target == target => Some(applied),
            other => {
                self.clear_previous(node, key, other)?;
                None
            }
        };
        let applied = self.apply_value(node, &target, value, old)?;
        Ok(Some(Entry::Value { target, applied }))
    }

    fn apply_map(
        &self,
        node: NodeId,
        values: &IndexMap<String, PropValue<Scalar>>,
        mut old: IndexMap<String, Applied>,
        target_for: impl Fn(&str) -> Target,
    ) -> Result<IndexMap<String, Applied>> {
        let removed: Vec<String> = old
            .keys()
            .filter(|name| !values.contains_key(*name))
            .cloned()
            .collect();
        for name in removed {
            if let Some(applied) = old.shift_remove(&name) {
                let last = applied.last();
                drop(applied);
                target_for(&name).clear(self.tree().as_ref(), node, last.as_ref())?;
            }
        }

        let mut next = IndexMap::with_capacity(values.len());
        for (name, value) in values {
            let previous = old.shift_remove(name);
            let applied = self.apply_value(node, &target_for(name), value, previous)?;
            next.insert(name.clone(), applied);
        }
        Ok(next)
    }

    /// Write one value, or bind it when it is reactive.
    fn apply_value(
        &self,
        node: NodeId,
        target: &Target,
        value: &PropValue<Scalar>,
        old: Option<Applied>,
    ) -> Result<Applied> {
        match value {
            PropValue::Static(v) => {
                if let Some(old) = old {
                    if old.is_fixed_to(v) {
                        return Ok(old);
                    }
                }
                target.write(self.tree().as_ref(), node, v)?;
                Ok(Applied::fixed(v.clone()))
            }
            reactive => {
                let last = Rc::new(RefCell::new(old.as_ref().and_then(Applied::last)));
                drop(old);
                let stop = self.bind(node, target.clone(), reactive.clone(), last.clone());
                Ok(Applied {
                    last,
                    binding: Some(Binding::new(stop)),
                })
            }
        }
    }

    /// Keep `target` in sync with a reactive value. Writes are skipped
    /// while the value equals the last one written.
    fn bind(
        &self,
        node: NodeId,
        target: Target,
        value: PropValue<Scalar>,
        last: Rc<RefCell<Option<Scalar>>>,
    ) -> Cleanup {
        let weak = self.downgrade();
        root_effect(move || {
            let next = value.get();
            if last.borrow().as_ref() == Some(&next) {
                return;
            }
            let Some(renderer) = weak.upgrade() else {
                return;
            };
            match target.write(renderer.tree().as_ref(), node, &next) {
                Ok(()) => *last.borrow_mut() = Some(next),
                Err(err) => renderer.record_error(err.into()),
            }
        })
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    fn apply_handler(
        &self,
        node: NodeId,
        key: &str,
        handler: &EventHandler,
        previous: Option<Entry>,
    ) -> Result<Option<Entry>> {
        let Some(event) = event_name(key) else {
            warn!("{}: handler under non-event key {:?} ignored", node, key);
            self.clear_previous(node, key, previous)?;
            return Ok(None);
        };
        if event == "insert" {
            if !matches!(previous, Some(Entry::InsertHook(_))) {
                self.clear_previous(node, key, previous)?;
            }
            return Ok(Some(Entry::InsertHook(handler.clone())));
        }
        if event == "remove" {
            warn!("{}: lifecycle key {:?} is not an event, ignored", node, key);
            self.clear_previous(node, key, previous)?;
            return Ok(None);
        }

        let delegated = self.config().is_delegated(&event);
        let unchanged = matches!(
            &previous,
            Some(Entry::Handler { event: e, handler: h, listener })
                if *e == event && Rc::ptr_eq(h, handler) && listener.is_none() == delegated
        );
        if unchanged {
            return Ok(previous);
        }
        self.clear_previous(node, key, previous)?;

        let listener = if delegated {
            self.delegation().register(self.tree(), &event);
            self.delegation().set_handler(node, &event, Some(handler.clone()));
            None
        } else {
            Some(self.tree().add_listener(node, &event, handler.clone())?)
        };
        trace!("{}: bound {} ({})", node, event, if delegated { "delegated" } else { "direct" });
        Ok(Some(Entry::Handler {
            event,
            handler: handler.clone(),
            listener,
        }))
    }

    // =========================================================================
    // Clearing
    // =========================================================================

    fn clear_previous(&self, node: NodeId, key: &str, previous: Option<Entry>) -> Result<()> {
        match previous {
            Some(entry) => self.clear_entry(node, key, entry),
            None => Ok(()),
        }
    }

    /// Undo what `entry` put on the node.
    fn clear_entry(&self, node: NodeId, key: &str, entry: Entry) -> Result<()> {
        let tree = self.tree().as_ref();
        match entry {
            Entry::Value { target, applied } => {
                let last = applied.last();
                drop(applied);
                target.clear(tree, node, last.as_ref())?;
            }
            Entry::StyleMap(map) => {
                for (name, applied) in map {
                    let last = applied.last();
                    drop(applied);
                    Target::Style(name).clear(tree, node, last.as_ref())?;
                }
            }
            Entry::ClassToggles(map) => {
                for (group, applied) in map {
                    let last = applied.last();
                    drop(applied);
                    Target::ClassToggle(group).clear(tree, node, last.as_ref())?;
                }
            }
            Entry::Handler { event, listener, .. } => match listener {
                Some(id) => tree.remove_listener(node, id)?,
                None => self.delegation().set_handler(node, &event, None),
            },
            Entry::Ref | Entry::InsertHook(_) => {
                trace!("{}: {:?} dropped", node, key);
            }
        }
        Ok(())
    }
}
