//! Core types for spark-patch.
//!
//! These types define the foundation that everything builds on.
//! They flow from declarative values through the patch engine and define
//! what a target tree has to understand.

use std::fmt;

// =============================================================================
// Node Handles
// =============================================================================

/// Handle to a node owned by a target tree.
///
/// Handles are plain indices, so equality is reference identity: two
/// handles are equal exactly when they name the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The three node kinds the engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Container node with a tag name, properties and children.
    Element,
    /// Leaf holding text content.
    Text,
    /// Comment-like placeholder anchoring an empty position.
    Marker,
}

impl NodeKind {
    /// Whether nodes of this kind can hold children.
    pub const fn is_container(self) -> bool {
        matches!(self, NodeKind::Element)
    }
}

/// Element namespace.
///
/// SVG elements always take attributes, never properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

impl Namespace {
    /// Namespace for an element with `tag` created inside a `parent` namespace.
    ///
    /// `svg` always opens the SVG namespace; `foreignObject` children go back to HTML.
    pub fn for_child(parent: Namespace, parent_tag: Option<&str>, tag: &str) -> Namespace {
        if tag.eq_ignore_ascii_case("svg") {
            return Namespace::Svg;
        }
        match parent {
            Namespace::Svg if parent_tag.is_some_and(|t| t.eq_ignore_ascii_case("foreignObject")) => {
                Namespace::Html
            }
            other => other,
        }
    }
}

// =============================================================================
// Scalar Values
// =============================================================================

/// Flat value assigned to an attribute, property or style entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    /// null / undefined: removes attributes, clears style entries.
    #[default]
    Null,
    /// `false` removes attributes, `true` sets them to an empty string.
    Bool(bool),
    Num(f64),
    Str(String),
}

impl Scalar {
    /// Attribute text for this value, `None` when the attribute is removed.
    pub fn attribute_text(&self) -> Option<String> {
        match self {
            Scalar::Null | Scalar::Bool(false) => None,
            Scalar::Bool(true) => Some(String::new()),
            Scalar::Num(n) => Some(format_number(*n)),
            Scalar::Str(s) => Some(s.clone()),
        }
    }

    /// Text used for style entries and serialisation (`Null` → empty).
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Num(n) => format_number(*n),
            Scalar::Str(s) => s.clone(),
        }
    }
}

/// Format a number the way a JavaScript engine prints it: integral values
/// lose the fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Num(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Num(value as f64)
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Num(value as f64)
    }
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Scalar::Num(value as f64)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

// =============================================================================
// Event Traits (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Static traits of a DOM event name.
    ///
    /// Events that bubble and compose across shadow roots benefit from
    /// delegation; everything else is attached directly on the node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventFlags: u8 {
        const NONE = 0;
        const BUBBLES = 1 << 0;
        const COMPOSED = 1 << 1;
        const CANCELABLE = 1 << 2;
        const DELEGATED = Self::BUBBLES.bits() | Self::COMPOSED.bits();
    }
}

impl EventFlags {
    /// Whether a root listener can observe the event on behalf of descendants.
    pub fn delegable(self) -> bool {
        self.contains(EventFlags::DELEGATED)
    }
}
