//! Connection sharing identity.

use std::fmt;

/// Identity of one shared stream: two subscriptions with equal keys ride the
/// same transport. Equality is structural across all three fields — a
/// different event name on the same URL is a different connection.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct StreamKey {
    pub url: String,
    pub event: String,
    pub with_credentials: bool,
}

impl StreamKey {
    pub fn new(url: impl Into<String>, event: impl Into<String>, with_credentials: bool) -> Self {
        Self {
            url: url.into(),
            event: event.into(),
            with_credentials,
        }
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "url:{}|event:{}|creds:{}",
            self.url,
            self.event,
            if self.with_credentials { 1 } else { 0 }
        )
    }
}
