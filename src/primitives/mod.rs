//! Primitives - The declarative building blocks handed to a patch.
//!
//! - [`View`] - The declarative value: text, empty, reactive, sequence,
//!   passed-through node or element description
//! - [`element`] / [`ElementSpec`] - Element descriptions and their builder
//! - [`Prop`] / [`PropValue`] - Property values (static, signal, getter)
//!
//! # Reactivity
//!
//! Props can be:
//! - Static values: `.attr("title", "Hello")`
//! - Signals: `.attr("title", title_signal)` (stays connected!)
//! - Getters: `.bind("title", move || format!("{} items", count.get()))`
//!
//! Pass signals and getters directly. Reading a signal while building the
//! description samples it once and breaks the fine-grained binding:
//!
//! ```ignore
//! // CORRECT - only the title attribute re-applies when `title` changes
//! element("h1").attr("title", title.clone());
//!
//! // WRONG - extracts the value, the element never sees later changes
//! element("h1").attr("title", title.get());
//! ```

mod element;
mod types;
mod view;

pub use element::{element, ElementSpec};
pub use types::*;
pub use view::{Getter, Marker, View};
