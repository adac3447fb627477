//! Minimal markup building helpers.

use std::fmt::Write;

/// Escape text interpolated into markup or attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// An element with children already rendered into `body`.
pub(crate) fn el(name: &str, attrs: &[(&str, String)], body: &str) -> String {
    let mut out = String::new();
    let _ = write!(out, "<{}", name);
    for (key, value) in attrs {
        let _ = write!(out, " {}=\"{}\"", key, escape_xml(value));
    }
    let _ = write!(out, ">{}</{}>", body, name);
    out
}

/// A childless, self-closing element.
pub(crate) fn leaf(name: &str, attrs: &[(&str, String)]) -> String {
    let mut out = String::new();
    let _ = write!(out, "<{}", name);
    for (key, value) in attrs {
        let _ = write!(out, " {}=\"{}\"", key, escape_xml(value));
    }
    out.push_str("/>");
    out
}
