//! Mount pipeline
//!
//! Connects a renderer to the lifetime of what it patched.
//!
//! ```text
//! mount(value) → effect scope → patch → MountHandle
//!                                          │
//!                        unmount → stop scope → remove nodes → release
//! ```

pub mod mount;

pub use mount::{mount, unmount, MountHandle};
