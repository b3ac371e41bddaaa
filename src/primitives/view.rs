//! Declarative values - What a patch is asked to produce.

use std::fmt;
use std::rc::Rc;

use spark_signals::Signal;

use super::element::ElementSpec;
use crate::types::{format_number, NodeId};

/// Zero-argument function producing the latest value of a reactive slot.
pub type Getter = Rc<dyn Fn() -> View>;

// =============================================================================
// Marker
// =============================================================================

/// Why a position is empty. The reason becomes the marker node's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marker {
    /// null / undefined
    #[default]
    Nothing,
    /// A boolean in child position.
    Flag(bool),
    /// A sequence that flattened to nothing.
    EmptyList,
}

impl Marker {
    pub fn payload(self) -> &'static str {
        match self {
            Marker::Nothing => "null",
            Marker::Flag(true) => "true",
            Marker::Flag(false) => "false",
            Marker::EmptyList => "[]",
        }
    }
}

// =============================================================================
// View
// =============================================================================

/// A declarative value.
#[derive(Clone)]
pub enum View {
    /// Text (numbers are coerced to text on conversion).
    Text(String),
    /// Nothing to show; anchored by a marker node.
    Empty(Marker),
    /// Re-evaluated whenever a signal it reads changes.
    Reactive(Getter),
    /// Ordered, arbitrarily nested values, flattened before use.
    Sequence(Vec<View>),
    /// An already materialised node, passed through.
    Node(NodeId),
    /// An element description.
    Element(ElementSpec),
}

impl View {
    /// Wrap a closure as a reactive value.
    pub fn reactive<F, V>(f: F) -> Self
    where
        F: Fn() -> V + 'static,
        V: Into<View>,
    {
        View::Reactive(Rc::new(move || f().into()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        View::Text(text.into())
    }

    pub fn empty() -> Self {
        View::Empty(Marker::Nothing)
    }

    /// Whether this value renders a marker and nothing else.
    pub fn is_empty(&self) -> bool {
        match self {
            View::Empty(_) => true,
            View::Sequence(items) => items.iter().all(View::is_empty),
            _ => false,
        }
    }
}

impl Default for View {
    fn default() -> Self {
        View::empty()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Text(t) => f.debug_tuple("Text").field(t).finish(),
            View::Empty(m) => f.debug_tuple("Empty").field(m).finish(),
            View::Reactive(_) => f.write_str("Reactive(..)"),
            View::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            View::Node(n) => f.debug_tuple("Node").field(n).finish(),
            View::Element(e) => f.debug_tuple("Element").field(e).finish(),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for View {
    fn from(value: &str) -> Self {
        View::Text(value.to_string())
    }
}

impl From<String> for View {
    fn from(value: String) -> Self {
        View::Text(value)
    }
}

impl From<&String> for View {
    fn from(value: &String) -> Self {
        View::Text(value.clone())
    }
}

macro_rules! view_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for View {
                fn from(value: $ty) -> Self {
                    View::Text(value.to_string())
                }
            }
        )*
    };
}

view_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for View {
    fn from(value: f64) -> Self {
        View::Text(format_number(value))
    }
}

impl From<f32> for View {
    fn from(value: f32) -> Self {
        View::Text(format_number(value as f64))
    }
}

impl From<bool> for View {
    fn from(value: bool) -> Self {
        View::Empty(Marker::Flag(value))
    }
}

impl From<()> for View {
    fn from(_: ()) -> Self {
        View::Empty(Marker::Nothing)
    }
}

impl<T: Into<View>> From<Option<T>> for View {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<T: Into<View>> From<Vec<T>> for View {
    fn from(items: Vec<T>) -> Self {
        View::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<NodeId> for View {
    fn from(node: NodeId) -> Self {
        View::Node(node)
    }
}

impl From<ElementSpec> for View {
    fn from(spec: ElementSpec) -> Self {
        View::Element(spec)
    }
}

impl From<Getter> for View {
    fn from(getter: Getter) -> Self {
        View::Reactive(getter)
    }
}

impl<T> From<Signal<T>> for View
where
    T: Clone + PartialEq + Into<View> + 'static,
{
    fn from(signal: Signal<T>) -> Self {
        View::Reactive(Rc::new(move || signal.get().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_payloads() {
        assert_eq!(Marker::Nothing.payload(), "null");
        assert_eq!(Marker::Flag(false).payload(), "false");
        assert_eq!(Marker::Flag(true).payload(), "true");
        assert_eq!(Marker::EmptyList.payload(), "[]");
    }

    #[test]
    fn test_conversions() {
        assert!(matches!(View::from(42), View::Text(ref t) if t == "42"));
        assert!(matches!(View::from(2.5), View::Text(ref t) if t == "2.5"));
        assert!(matches!(View::from(true), View::Empty(Marker::Flag(true))));
        assert!(matches!(View::from(None::<&str>), View::Empty(Marker::Nothing)));
        assert!(matches!(View::from(vec!["a", "b"]), View::Sequence(ref v) if v.len() == 2));
    }

    #[test]
    fn test_is_empty() {
        assert!(View::empty().is_empty());
        assert!(View::Sequence(vec![View::empty(), false.into()]).is_empty());
        assert!(!View::Sequence(vec![View::empty(), "x".into()]).is_empty());
    }
}
