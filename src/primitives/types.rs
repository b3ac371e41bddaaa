//! Primitive types - Props and cleanup.
//!
//! These types define the property side of an element description.
//! Props support static values, signals, and getters for reactivity.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use spark_signals::Signal;

use crate::tree::EventHandler;
use crate::types::{NodeId, Scalar};

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by mounts and bindings.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Callback Types
// =============================================================================

/// Called once with the materialised node when a `ref` prop is first applied.
pub type RefCallback = Rc<dyn Fn(NodeId)>;

// =============================================================================
// Prop Value - Reactive property wrapper
// =============================================================================

/// A property value that can be static, a signal, or a getter.
///
/// Static values are diffed against the last applied value. Signals and
/// getters get a binding of their own, so an invalidation re-applies only
/// that one property.
#[derive(Clone)]
pub enum PropValue<T: Clone + PartialEq + 'static> {
    /// Static value (not reactive).
    Static(T),
    /// Reactive signal (changes propagate automatically).
    Signal(Signal<T>),
    /// Getter function (called each time value is needed).
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + PartialEq + 'static> PropValue<T> {
    /// Get the current value (for immediate reads).
    pub fn get(&self) -> T {
        match self {
            PropValue::Static(v) => v.clone(),
            PropValue::Signal(s) => s.get(),
            PropValue::Getter(f) => f(),
        }
    }

    pub fn is_reactive(&self) -> bool {
        !matches!(self, PropValue::Static(_))
    }

    /// Wrap a getter closure.
    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        PropValue::Getter(Rc::new(f))
    }
}

impl<T: Clone + PartialEq + Into<Scalar> + 'static> PropValue<T> {
    /// Same value source, producing [`Scalar`]s.
    pub fn to_scalar(&self) -> PropValue<Scalar> {
        match self {
            PropValue::Static(v) => PropValue::Static(v.clone().into()),
            PropValue::Signal(s) => {
                let s = s.clone();
                PropValue::Getter(Rc::new(move || s.get().into()))
            }
            PropValue::Getter(f) => {
                let f = f.clone();
                PropValue::Getter(Rc::new(move || f().into()))
            }
        }
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for PropValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Static(v) => f.debug_tuple("Static").field(v).finish(),
            PropValue::Signal(_) => f.write_str("Signal(..)"),
            PropValue::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for PropValue<T> {
    fn default() -> Self {
        PropValue::Static(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for PropValue<T> {
    fn from(value: T) -> Self {
        PropValue::Static(value)
    }
}

impl<T: Clone + PartialEq + 'static> From<Signal<T>> for PropValue<T> {
    fn from(signal: Signal<T>) -> Self {
        PropValue::Signal(signal)
    }
}

// Scalar props accept plain Rust values
impl From<&str> for PropValue<Scalar> {
    fn from(value: &str) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<String> for PropValue<Scalar> {
    fn from(value: String) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<bool> for PropValue<Scalar> {
    fn from(value: bool) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<f64> for PropValue<Scalar> {
    fn from(value: f64) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<i32> for PropValue<Scalar> {
    fn from(value: i32) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<usize> for PropValue<Scalar> {
    fn from(value: usize) -> Self {
        PropValue::Static(value.into())
    }
}

impl From<Signal<String>> for PropValue<Scalar> {
    fn from(signal: Signal<String>) -> Self {
        PropValue::Getter(Rc::new(move || signal.get().into()))
    }
}

impl From<Signal<bool>> for PropValue<Scalar> {
    fn from(signal: Signal<bool>) -> Self {
        PropValue::Getter(Rc::new(move || signal.get().into()))
    }
}

impl From<&str> for PropValue<String> {
    fn from(value: &str) -> Self {
        PropValue::Static(value.to_string())
    }
}

// =============================================================================
// Props
// =============================================================================

/// Value of the `style` prop.
#[derive(Clone, Debug)]
pub enum StyleProp {
    /// Whole `style` attribute text.
    Text(PropValue<String>),
    /// Individual entries, diffed key by key. Names starting with `-` are
    /// custom properties.
    Map(IndexMap<String, PropValue<Scalar>>),
}

/// Value of the `classList` prop.
#[derive(Clone, Debug)]
pub enum ClassProp {
    /// Whole class name.
    Name(PropValue<String>),
    /// Class group (one or more space-separated names) → membership.
    Toggles(IndexMap<String, PropValue<bool>>),
}

impl ClassProp {
    /// Class name from a list of classes.
    pub fn list<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined: Vec<String> = classes.into_iter().map(|c| c.as_ref().to_string()).collect();
        ClassProp::Name(PropValue::Static(joined.join(" ")))
    }
}

/// One entry of an element's property mapping.
#[derive(Clone)]
pub enum Prop {
    /// Attribute, property or namespaced attribute.
    Value(PropValue<Scalar>),
    Style(StyleProp),
    Classes(ClassProp),
    /// Event binding; only meaningful under an `on*` key.
    Handler(EventHandler),
    /// Node reference callback; only meaningful under the `ref` key.
    Ref(RefCallback),
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Prop::Style(s) => f.debug_tuple("Style").field(s).finish(),
            Prop::Classes(c) => f.debug_tuple("Classes").field(c).finish(),
            Prop::Handler(_) => f.write_str("Handler(..)"),
            Prop::Ref(_) => f.write_str("Ref(..)"),
        }
    }
}

impl From<PropValue<Scalar>> for Prop {
    fn from(value: PropValue<Scalar>) -> Self {
        Prop::Value(value)
    }
}

impl From<StyleProp> for Prop {
    fn from(style: StyleProp) -> Self {
        Prop::Style(style)
    }
}

impl From<ClassProp> for Prop {
    fn from(classes: ClassProp) -> Self {
        Prop::Classes(classes)
    }
}
