//! Element descriptions and their builder.
//!
//! ```ignore
//! use spark_patch::primitives::element;
//!
//! let button = element("button")
//!     .attr("type", "submit")
//!     .class("primary", true)
//!     .style("fontSize", "12px")
//!     .on("click", |_event| println!("clicked"))
//!     .child("Save");
//! ```

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::types::{ClassProp, Prop, PropValue, StyleProp};
use super::view::View;
use crate::tree::Event;
use crate::types::{NodeId, Scalar};

/// Record describing an element: optional tag, properties and children.
#[derive(Clone, Default)]
pub struct ElementSpec {
    /// `None` uses the renderer's default tag.
    pub tag: Option<String>,
    /// Property mapping, in application order.
    pub props: IndexMap<String, Prop>,
    /// Child value, patched into the element's own child region.
    pub children: Option<Box<View>>,
}

/// Start describing an element with `tag`.
pub fn element(tag: impl Into<String>) -> ElementSpec {
    ElementSpec::new(Some(tag.into()))
}

impl ElementSpec {
    pub fn new(tag: Option<String>) -> Self {
        Self {
            tag,
            props: IndexMap::new(),
            children: None,
        }
    }

    /// Set any prop under `key`.
    pub fn prop(mut self, key: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.props.insert(key.into(), prop.into());
        self
    }

    /// Attribute or property value (static, signal or getter).
    pub fn attr(self, key: impl Into<String>, value: impl Into<PropValue<Scalar>>) -> Self {
        self.prop(key, Prop::Value(value.into()))
    }

    /// Reactive attribute or property computed by `f`.
    pub fn bind<F, S>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> S + 'static,
        S: Into<Scalar>,
    {
        self.attr(key, PropValue::Getter(Rc::new(move || f().into())))
    }

    /// Add one style entry, diffed independently of the others.
    pub fn style(mut self, name: impl Into<String>, value: impl Into<PropValue<Scalar>>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.props.get_mut("style") {
            Some(Prop::Style(StyleProp::Map(map))) => {
                map.insert(name, value);
            }
            _ => {
                let mut map = IndexMap::new();
                map.insert(name, value);
                self.props.insert("style".to_string(), Prop::Style(StyleProp::Map(map)));
            }
        }
        self
    }

    /// Set the whole `style` attribute.
    pub fn style_text(self, text: impl Into<PropValue<String>>) -> Self {
        self.prop("style", Prop::Style(StyleProp::Text(text.into())))
    }

    /// Toggle a class group (one or more space-separated names).
    pub fn class(mut self, group: impl Into<String>, on: impl Into<PropValue<bool>>) -> Self {
        let group = group.into();
        let on = on.into();
        match self.props.get_mut("classList") {
            Some(Prop::Classes(ClassProp::Toggles(map))) => {
                map.insert(group, on);
            }
            _ => {
                let mut map = IndexMap::new();
                map.insert(group, on);
                self.props.insert("classList".to_string(), Prop::Classes(ClassProp::Toggles(map)));
            }
        }
        self
    }

    /// Set the whole class name.
    pub fn class_name(self, name: impl Into<PropValue<String>>) -> Self {
        self.prop("classList", Prop::Classes(ClassProp::Name(name.into())))
    }

    /// Bind a handler for `event` (`"click"` or `"onClick"`).
    ///
    /// Only `on` followed by an uppercase letter is taken as a prop key, so
    /// events such as `online` keep their full name.
    pub fn on(self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        let is_prop_key = event
            .strip_prefix("on")
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_uppercase());
        let key = if is_prop_key {
            event.to_string()
        } else {
            format!("on{}", event)
        };
        self.prop(key, Prop::Handler(Rc::new(handler)))
    }

    /// Receive the materialised node once it exists.
    pub fn node_ref(self, callback: impl Fn(NodeId) + 'static) -> Self {
        self.prop("ref", Prop::Ref(Rc::new(callback)))
    }

    /// Append a child value.
    pub fn child(mut self, child: impl Into<View>) -> Self {
        let child = child.into();
        self.children = Some(Box::new(match self.children.take().map(|c| *c) {
            None => child,
            Some(View::Sequence(mut items)) => {
                items.push(child);
                View::Sequence(items)
            }
            Some(existing) => View::Sequence(vec![existing, child]),
        }));
        self
    }

    /// Replace the child value.
    pub fn children(mut self, children: impl Into<View>) -> Self {
        self.children = Some(Box::new(children.into()));
        self
    }
}

impl fmt::Debug for ElementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementSpec")
            .field("tag", &self.tag)
            .field("props", &self.props)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_props() {
        let spec = element("div")
            .attr("id", "main")
            .style("color", "red")
            .style("fontSize", "12px")
            .class("a b", true)
            .on("click", |_e| {});

        assert_eq!(spec.tag.as_deref(), Some("div"));
        let keys: Vec<&str> = spec.props.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "style", "classList", "onclick"]);
        match spec.props.get("style") {
            Some(Prop::Style(StyleProp::Map(map))) => assert_eq!(map.len(), 2),
            other => panic!("unexpected style prop {:?}", other),
        }
    }

    #[test]
    fn test_child_accumulates_sequence() {
        let spec = element("ul").child("a").child("b").child("c");
        match spec.children.as_deref() {
            Some(View::Sequence(items)) => assert_eq!(items.len(), 3),
            other => panic!("unexpected children {:?}", other),
        }
    }

    #[test]
    fn test_on_keeps_prefixed_key() {
        let spec = element("input").on("onInput", |_e| {});
        assert!(spec.props.contains_key("onInput"));
    }

    #[test]
    fn test_on_prefixes_events_starting_with_on() {
        let spec = element("body").on("online", |_e| {}).on("click", |_e| {});
        assert!(spec.props.contains_key("ononline"));
        assert!(spec.props.contains_key("onclick"));
        assert_eq!(crate::events::event_name("ononline").as_deref(), Some("online"));
    }
}
