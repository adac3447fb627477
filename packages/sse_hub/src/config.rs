//! Per-target stream configuration.
//!
//! The host environment (attribute scraping, config files, whatever) produces
//! one of these records per UI target; the hub only validates and consumes
//! it. The render callback is not part of the record — it is injected as an
//! explicit handle at setup time, never looked up by name.

use serde::{Deserialize, Serialize};

use crate::error::HubError;
use crate::history::Mode;
use crate::key::StreamKey;

fn default_cache_size() -> usize {
    20
}

fn default_event() -> String {
    "message".to_string()
}

/// Recognized per-target options, with the original attribute defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Stream endpoint. Required; an empty URL fails setup fast.
    #[serde(default)]
    pub url: String,
    /// Bound on retained history / rendered children for this target, and
    /// the consumer window on the shared path.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    /// Named SSE event to listen for.
    #[serde(default = "default_event")]
    pub event: String,
    /// Which end of the target new fragments land on (direct path only).
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub with_credentials: bool,
    /// Wrap raw fragments in an escaped `<pre>` before insertion.
    #[serde(default)]
    pub escape_output: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            cache_size: default_cache_size(),
            event: default_event(),
            mode: Mode::default(),
            with_credentials: false,
            escape_output: false,
        }
    }
}

impl StreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), HubError> {
        if self.url.trim().is_empty() {
            return Err(HubError::MissingUrl);
        }
        Ok(())
    }

    /// Sharing identity for this configuration.
    pub fn key(&self) -> StreamKey {
        StreamKey::new(self.url.clone(), self.event.clone(), self.with_credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_attribute_defaults() {
        let config: StreamConfig = serde_json::from_str(r#"{"url": "/events"}"#).unwrap();
        assert_eq!(config.cache_size, 20);
        assert_eq!(config.event, "message");
        assert_eq!(config.mode, Mode::Append);
        assert!(!config.with_credentials);
        assert!(!config.escape_output);
    }

    #[test]
    fn mode_deserializes_lowercase() {
        let config: StreamConfig =
            serde_json::from_str(r#"{"url": "/events", "mode": "prepend"}"#).unwrap();
        assert_eq!(config.mode, Mode::Prepend);
    }

    #[test]
    fn missing_url_fails_validation() {
        let config = StreamConfig::default();
        assert!(matches!(config.validate(), Err(HubError::MissingUrl)));
        assert!(StreamConfig::new("  ").validate().is_err());
        assert!(StreamConfig::new("/events").validate().is_ok());
    }

    #[test]
    fn key_carries_all_three_fields() {
        let mut config = StreamConfig::new("/events");
        config.event = "tick".into();
        config.with_credentials = true;
        let key = config.key();
        assert_eq!(key.url, "/events");
        assert_eq!(key.event, "tick");
        assert!(key.with_credentials);
    }
}
