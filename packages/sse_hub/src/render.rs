//! Render contract between the hub and its consumers.
//!
//! Targets are opaque to the hub: it only ever replaces content wholesale,
//! attaches or detaches fragments at either end, and reads the existing
//! fragments once for seeding. What a "target" physically is belongs to the
//! host environment.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::payload::Payload;

/// Stable identity of a UI target, assigned by the host environment.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target-{}", self.0)
    }
}

/// An opaque UI target the hub renders into.
pub trait RenderTarget: Send + Sync {
    fn id(&self) -> TargetId;
    /// Replace the rendered content wholesale.
    fn set_content(&self, markup: &str);
    fn append_child(&self, fragment: &str);
    fn prepend_child(&self, fragment: &str);
    fn remove_first_child(&self);
    fn remove_last_child(&self);
    /// Fragments currently attached, in display order. Read once at setup to
    /// seed a direct binding.
    fn children(&self) -> Vec<String>;
}

/// What a render callback may hand back.
///
/// `Markup` is used verbatim; `Value` is coerced. A callback that mutated
/// the target itself returns `Ok(None)` instead.
#[derive(Clone, Debug)]
pub enum RenderOutput {
    Markup(String),
    Value(serde_json::Value),
}

impl RenderOutput {
    /// Total coercion to a markup string. Never fails: structured values
    /// pretty-print inside an escaped `<pre>`, falling back to their compact
    /// form if pretty serialization is refused.
    pub fn into_markup(self) -> String {
        match self {
            RenderOutput::Markup(markup) => markup,
            RenderOutput::Value(value) => match serde_json::to_string_pretty(&value) {
                Ok(pretty) => format!("<pre>{}</pre>", escape_html(&pretty)),
                Err(_) => value.to_string(),
            },
        }
    }
}

impl From<String> for RenderOutput {
    fn from(markup: String) -> Self {
        RenderOutput::Markup(markup)
    }
}

impl From<&str> for RenderOutput {
    fn from(markup: &str) -> Self {
        RenderOutput::Markup(markup.to_string())
    }
}

impl From<serde_json::Value> for RenderOutput {
    fn from(value: serde_json::Value) -> Self {
        RenderOutput::Value(value)
    }
}

/// Context handed to render callbacks alongside the history slice.
#[derive(Clone, Debug)]
pub struct RenderContext {
    /// The consumer's window size.
    pub window: usize,
    /// Total items currently retained by the shared connection.
    pub history_len: usize,
    /// How many deliveries this consumer has received, the initial backlog
    /// delivery included.
    pub deliveries: u64,
}

/// A consumer's render callback.
///
/// Gets the newest `window` payloads oldest-first. Returning
/// `Ok(Some(output))` replaces the target's content with the coerced
/// output; `Ok(None)` means the callback already updated the target itself.
/// An `Err` is caught by the connection, logged, and isolated to this
/// consumer — the target keeps its previous content.
pub trait Render: Send + Sync {
    fn render(
        &self,
        items: &[Payload],
        target: &dyn RenderTarget,
        ctx: &RenderContext,
    ) -> Result<Option<RenderOutput>>;
}

impl<F> Render for F
where
    F: Fn(&[Payload], &dyn RenderTarget, &RenderContext) -> Result<Option<RenderOutput>>
        + Send
        + Sync,
{
    fn render(
        &self,
        items: &[Payload],
        target: &dyn RenderTarget,
        ctx: &RenderContext,
    ) -> Result<Option<RenderOutput>> {
        self(items, target, ctx)
    }
}

/// Boxed renderer handle as stored in configuration records.
pub type RenderFn = Arc<dyn Render>;

/// Minimal HTML escaping for text interpolated into fragments.
pub fn escape_html(text: &str) -> String {
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
