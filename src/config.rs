//! Render configuration - Routing tables injected into a renderer.
//!
//! Property routing is decided from explicit tables instead of asking the
//! target node at runtime which keys it exposes. Keys that appear in no
//! table fall back to plain attribute assignment.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::events::DELEGATED_EVENTS;
use crate::types::Namespace;

/// HTML keys assigned as node properties rather than attributes.
pub const HTML_PROPERTIES: &[&str] = &[
    "value",
    "checked",
    "selected",
    "muted",
    "indeterminate",
    "defaultValue",
    "defaultChecked",
    "textContent",
    "innerText",
    "innerHTML",
    "htmlFor",
    "readOnly",
    "tabIndex",
    "contentEditable",
    "scrollTop",
    "scrollLeft",
    "currentTime",
    "volume",
    "playbackRate",
    "srcObject",
];

/// Keys that always take the attribute path, whatever the node exposes.
pub const ATTRIBUTE_ONLY: &[&str] = &["list", "form"];

/// Configuration of a [`Renderer`](crate::Renderer).
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Events handled through the delegation registry.
    pub delegated_events: IndexSet<String>,
    /// Attribute prefix (`xlink` in `xlink:href`) → namespace URI.
    pub namespaces: IndexMap<String, String>,
    /// Keys assigned as properties on HTML elements. SVG elements never
    /// take properties.
    pub properties: HashSet<String>,
    /// Tag used when an element description has none.
    pub default_tag: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let mut namespaces = IndexMap::new();
        namespaces.insert("xlink".to_string(), "http://www.w3.org/1999/xlink".to_string());
        namespaces.insert("xml".to_string(), "http://www.w3.org/XML/1998/namespace".to_string());

        Self {
            delegated_events: DELEGATED_EVENTS.iter().map(|e| e.to_string()).collect(),
            namespaces,
            properties: HTML_PROPERTIES.iter().map(|p| p.to_string()).collect(),
            default_tag: "div".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route an additional event through delegation.
    pub fn with_delegated_event(mut self, event: impl Into<String>) -> Self {
        self.delegated_events.insert(event.into());
        self
    }

    /// Attach `event` directly on nodes instead of delegating it.
    pub fn without_delegated_event(mut self, event: &str) -> Self {
        self.delegated_events.shift_remove(event);
        self
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>) -> Self {
        self.properties.insert(key.into());
        self
    }

    pub fn with_default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = tag.into();
        self
    }

    pub fn is_delegated(&self, event: &str) -> bool {
        self.delegated_events.contains(event)
    }

    /// Namespace URI for a `prefix:name` key, if the prefix is known.
    pub fn namespace_for(&self, key: &str) -> Option<&str> {
        let (prefix, _) = key.split_once(':')?;
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Whether `key` is assigned as a property on an element in `namespace`.
    pub fn is_property(&self, namespace: Namespace, key: &str) -> bool {
        namespace == Namespace::Html
            && !ATTRIBUTE_ONLY.contains(&key)
            && self.properties.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert!(config.is_delegated("click"));
        assert!(!config.is_delegated("focus"));
        assert_eq!(config.default_tag, "div");
        assert_eq!(config.namespace_for("xlink:href"), Some("http://www.w3.org/1999/xlink"));
        assert_eq!(config.namespace_for("foo:bar"), None);
        assert_eq!(config.namespace_for("href"), None);
    }

    #[test]
    fn test_property_routing_table() {
        let config = RenderConfig::default();
        assert!(config.is_property(Namespace::Html, "value"));
        assert!(!config.is_property(Namespace::Svg, "value"), "svg always uses attributes");
        assert!(!config.is_property(Namespace::Html, "data-id"));

        let config = config.with_property("list");
        assert!(!config.is_property(Namespace::Html, "list"), "list is attribute-only");
    }

    #[test]
    fn test_builders() {
        let config = RenderConfig::new()
            .without_delegated_event("click")
            .with_delegated_event("focusin")
            .with_default_tag("section");
        assert!(!config.is_delegated("click"));
        assert!(config.is_delegated("focusin"));
        assert_eq!(config.default_tag, "section");
    }
}
