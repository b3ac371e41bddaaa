//! Events Module - Event traits and delegation.
//!
//! - [`event_flags`] - Static trait table for DOM event names
//! - [`event_name`] - Map an `on*` property key to its event name
//! - [`EventDelegation`] - Root-listener registry multiplexed to per-node slots
//!
//! # Delegation
//!
//! Events that bubble and compose are handled through a single listener at
//! the root of the target tree. Everything else (focus, blur, enter/leave,
//! load, scroll, ...) is attached directly on the node, since a root
//! listener would never observe it.

mod delegation;

pub use delegation::EventDelegation;

use crate::types::EventFlags;

// =============================================================================
// Event Table
// =============================================================================

/// Events handled through the delegation registry by default.
pub const DELEGATED_EVENTS: &[&str] = &[
    "keydown",
    "keypress",
    "keyup",
    "click",
    "contextmenu",
    "dblclick",
    "doubleclick",
    "drag",
    "dragend",
    "dragenter",
    "dragexit",
    "dragleave",
    "dragover",
    "dragstart",
    "drop",
    "mousedown",
    "mousemove",
    "mouseout",
    "mouseover",
    "mouseup",
    "pointerdown",
    "pointermove",
    "pointerout",
    "pointerover",
    "pointerup",
    "touchcancel",
    "touchend",
    "touchmove",
    "touchstart",
];

/// Events that never bubble.
const NON_BUBBLING: &[&str] = &[
    "focus",
    "blur",
    "mouseenter",
    "mouseleave",
    "pointerenter",
    "pointerleave",
    "load",
    "unload",
    "error",
    "scroll",
    "resize",
    "abort",
    "play",
    "pause",
    "ended",
];

/// Events that bubble but are not composed across shadow roots.
const NOT_COMPOSED: &[&str] = &["change", "submit", "reset", "select", "toggle"];

/// Events whose default action cannot be prevented.
const NOT_CANCELABLE: &[&str] = &["input", "change", "mousemove", "pointermove"];

/// Static traits of an event name.
///
/// Unknown names are treated as bubbling custom events.
pub fn event_flags(name: &str) -> EventFlags {
    if NON_BUBBLING.contains(&name) {
        return EventFlags::NONE;
    }
    let mut flags = EventFlags::BUBBLES;
    if !NOT_COMPOSED.contains(&name) {
        flags |= EventFlags::COMPOSED;
    }
    if !NOT_CANCELABLE.contains(&name) {
        flags |= EventFlags::CANCELABLE;
    }
    flags
}

/// Event name for an `on*` property key (`onClick` → `click`).
///
/// Returns `None` for keys that are not event bindings.
pub fn event_name(key: &str) -> Option<String> {
    let rest = key.strip_prefix("on")?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_flags_table() {
        assert!(event_flags("click").delegable());
        assert!(event_flags("keydown").delegable());
        assert!(!event_flags("focus").contains(EventFlags::BUBBLES));
        assert!(!event_flags("mouseenter").delegable());
        assert!(event_flags("change").contains(EventFlags::BUBBLES));
        assert!(!event_flags("change").delegable());
        assert!(event_flags("my-custom").delegable());
    }

    #[test]
    fn test_event_name() {
        assert_eq!(event_name("onClick"), Some("click".to_string()));
        assert_eq!(event_name("onkeydown"), Some("keydown".to_string()));
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("title"), None);
    }

    #[test]
    fn test_delegated_events_are_delegable_or_bubble() {
        for name in DELEGATED_EVENTS {
            assert!(
                event_flags(name).contains(EventFlags::BUBBLES),
                "{} should bubble",
                name
            );
        }
    }
}
