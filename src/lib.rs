//! # spark-patch
//!
//! Fine-grained reactive patch engine for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! A declarative value ([`View`]) is patched into a container of a target
//! tree. Every patch returns a [`Rendered`] result that is handed back as
//! `previous` on the next patch of the same region, so the engine only
//! touches what changed:
//!
//! ```text
//! View ──patch──► text / marker / element / sequence / reactive slot
//!                         │           │            │
//!                      assign     reconcile ──► four-pointer diff
//!                         │
//!                  attributes, properties, styles, classes, handlers
//! ```
//!
//! Reactive values (signals and getters) become tracked slots: when a
//! signal they read changes, only that slot re-patches its own region.
//!
//! ## Modules
//!
//! - [`types`] - Core types (NodeId, Namespace, Scalar, EventFlags)
//! - [`tree`] - The [`TargetTree`] trait and the in-memory [`Document`]
//! - [`primitives`] - Declarative values and element descriptions
//! - [`renderer`] - Patch, assign, reconcile and the sequence diff
//! - [`events`] - Event classification and the delegation registry
//! - [`pipeline`] - Mount / unmount
//! - [`reactive`] - Accumulator-threaded tracked computations
//! - [`serialize`] - Rendering values straight to HTML text

pub mod config;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod primitives;
pub mod reactive;
pub mod renderer;
pub mod serialize;
pub mod tree;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::RenderConfig;

pub use error::{RenderError, Result, TreeError};

pub use events::{event_flags, event_name, EventDelegation, DELEGATED_EVENTS};

pub use pipeline::{mount, unmount, MountHandle};

pub use primitives::{
    element, ClassProp, Cleanup, ElementSpec, Getter, Marker, Prop, PropValue, RefCallback,
    StyleProp, View,
};

pub use reactive::{track, Tracked};

pub use renderer::{diff, LiveSlot, Renderer, Rendered};

pub use serialize::render_to_string;

pub use tree::{Document, Event, EventHandler, ListenerId, Mutation, MutationCounts, TargetTree};
