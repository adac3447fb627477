//! Push-stream transport interface.
//!
//! The hub never speaks a wire protocol itself: it opens transports through a
//! factory and consumes delivered events. Reconnection and backoff belong
//! entirely to the transport implementation — the hub reacts only to
//! delivered messages and terminal close (the event channel ending).

mod http;

pub use http::{HttpSseTransport, HttpTransportFactory};

use tokio::sync::broadcast;

use crate::error::HubError;

/// One raw delivered message, before decoding.
#[derive(Clone, Debug)]
pub struct RawEvent {
    /// SSE event name this message arrived under.
    pub event: String,
    pub data: String,
    /// Receive time, milliseconds since the epoch.
    pub timestamp: i64,
}

impl RawEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Options forwarded to the factory when opening a stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransportOptions {
    pub with_credentials: bool,
}

/// A live push stream.
///
/// `events` hands out a receiver for messages with the given event name; the
/// sender side closing is the terminal-close signal. `close` must be
/// idempotent — the registry may race teardown paths.
pub trait EventTransport: Send + Sync {
    fn events(&self, event: &str) -> broadcast::Receiver<RawEvent>;
    fn close(&self);
}

/// Opens transports on demand. Errors propagate to the caller untouched;
/// the hub never retries construction.
pub trait TransportFactory: Send + Sync {
    fn open(
        &self,
        url: &str,
        options: TransportOptions,
    ) -> Result<std::sync::Arc<dyn EventTransport>, HubError>;
}
