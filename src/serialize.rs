//! String rendering - Declarative values straight to HTML text.
//!
//! [`render_to_string`] walks a [`View`] without any target tree, for
//! server-side output or snapshots:
//!
//! - reactive values are sampled once
//! - handlers and refs are skipped
//! - attribute keys are written in kebab-case, `className` as `class`
//! - style maps become `name:value;` runs
//! - empty values and passed-through nodes produce nothing
//! - void elements self-close (`<br/>`)
//!
//! The escaping helpers are shared with [`crate::tree::Document`]'s HTML output.

use crate::primitives::{ClassProp, ElementSpec, Prop, StyleProp, View};
use crate::types::Scalar;

/// Elements that never have children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "command", "embed", "frame", "hr",
    "image", "img", "input", "isindex", "keygen", "link", "menuitem", "meta", "nextid", "param",
    "source", "track", "wbr",
];

/// Render a declarative value to HTML text.
pub fn render_to_string(view: &View) -> String {
    let mut out = String::new();
    write_view(view, &mut out);
    out
}

fn write_view(view: &View, out: &mut String) {
    match view {
        View::Text(text) => out.push_str(&escape_text(text)),
        View::Empty(_) | View::Node(_) => {}
        View::Reactive(getter) => write_view(&getter(), out),
        View::Sequence(items) => {
            for item in items {
                write_view(item, out);
            }
        }
        View::Element(spec) => write_element(spec, out),
    }
}

fn write_element(spec: &ElementSpec, out: &mut String) {
    let tag = spec.tag.as_deref().unwrap_or("div");
    out.push('<');
    out.push_str(tag);

    for (key, prop) in &spec.props {
        match prop {
            Prop::Value(value) => {
                if let Some(text) = value.get().attribute_text() {
                    let name = if key == "className" { "class".to_string() } else { kebab_case(key) };
                    push_attribute(out, &name, &text);
                }
            }
            Prop::Style(StyleProp::Text(text)) => push_attribute(out, "style", &text.get()),
            Prop::Style(StyleProp::Map(entries)) => {
                let style: String = entries
                    .iter()
                    .filter_map(|(name, value)| {
                        let value = value.get();
                        if matches!(value, Scalar::Null) {
                            return None;
                        }
                        let name = if name.starts_with('-') { name.clone() } else { kebab_case(name) };
                        Some(format!("{}:{};", name, value.to_text()))
                    })
                    .collect();
                if !style.is_empty() {
                    push_attribute(out, "style", &style);
                }
            }
            Prop::Classes(ClassProp::Name(name)) => push_attribute(out, "class", &name.get()),
            Prop::Classes(ClassProp::Toggles(groups)) => {
                let on: Vec<&str> = groups
                    .iter()
                    .filter(|(_, on)| on.get())
                    .map(|(group, _)| group.as_str())
                    .collect();
                if !on.is_empty() {
                    push_attribute(out, "class", &on.join(" "));
                }
            }
            Prop::Handler(_) | Prop::Ref(_) => {}
        }
    }

    if is_void_element(tag) {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(children) = &spec.children {
        write_view(children, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

pub(crate) fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attribute(value));
    out.push('"');
}

// =============================================================================
// Helpers
// =============================================================================

/// Whether `tag` is a void element (case-insensitive).
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// `fontSize` → `font-size`, `data_id` → `data-id`.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == ' ' {
            out.push('-');
            prev_lower = false;
        } else if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::element;
    use spark_signals::signal;

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("fontSize"), "font-size");
        assert_eq!(kebab_case("backgroundColor"), "background-color");
        assert_eq!(kebab_case("data_id"), "data-id");
        assert_eq!(kebab_case("ariaLabel"), "aria-label");
        assert_eq!(kebab_case("id"), "id");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attribute("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_void_elements() {
        assert!(is_void_element("br"));
        assert!(is_void_element("IMG"));
        assert!(!is_void_element("div"));
    }

    #[test]
    fn test_render_element() {
        let view = element("a")
            .attr("href", "/home")
            .attr("ariaLabel", "Home")
            .attr("hidden", false)
            .style("fontSize", "12px")
            .class("nav", true)
            .class("off", false)
            .on("click", |_e| {})
            .child("Home & away");
        assert_eq!(
            render_to_string(&view.into()),
            "<a href=\"/home\" aria-label=\"Home\" style=\"font-size:12px;\" class=\"nav\">Home &amp; away</a>"
        );
    }

    #[test]
    fn test_render_void_and_default_tag() {
        let view = View::Sequence(vec![
            element("br").into(),
            ElementSpec::new(None).child("x").into(),
            View::empty(),
        ]);
        assert_eq!(render_to_string(&view), "<br/><div>x</div>");
    }

    #[test]
    fn test_render_samples_reactive_values() {
        let name = signal(String::from("Ada"));
        let n = name.clone();
        let view = element("p")
            .attr("title", name.clone())
            .child(View::reactive(move || n.get()));
        assert_eq!(render_to_string(&view.into()), "<p title=\"Ada\">Ada</p>");
    }
}
