//! Decoded form of one delivered message.

use std::fmt;

use serde_json::Value;

/// One decoded message. Messages are tried as JSON first; anything that does
/// not parse is kept verbatim as `Text` — decoding never drops a message.
///
/// The tag makes "this was real JSON" distinguishable from "this happened to
/// be a string" downstream, instead of leaving renderers to inspect the shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Total decode: JSON parse failure falls back to the raw text.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(raw.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Json(_) => None,
            Payload::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Json(value) => write!(f, "{}", value),
            Payload::Text(text) => f.write_str(text),
        }
    }
}
