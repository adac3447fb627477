//! SSE Hub - shared push-stream multiplexing with bounded history
//!
//! This crate delivers server-pushed events to many independent UI consumers
//! while opening at most one stream per distinct (URL, event name,
//! credentials) key. Each shared connection keeps a capped, ordered history
//! of decoded payloads and fans every arriving message out to all of its
//! consumers as an immutable snapshot; consumers apply their own window and
//! render callback. Targets configured without a callback get a direct
//! binding instead: a dedicated stream whose payloads are inserted into the
//! target as ready-made fragments.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sse_hub::{
//!     HttpTransportFactory, Payload, RenderContext, RenderFn, RenderOutput,
//!     RenderTarget, StreamConfig, StreamHub,
//! };
//!
//! fn show_latest(
//!     items: &[Payload],
//!     _target: &dyn RenderTarget,
//!     _ctx: &RenderContext,
//! ) -> anyhow::Result<Option<RenderOutput>> {
//!     let latest = items.last().map(|p| p.to_string()).unwrap_or_default();
//!     Ok(Some(RenderOutput::Markup(format!("<p>{latest}</p>"))))
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let factory = Arc::new(HttpTransportFactory::new()?);
//!     let hub = StreamHub::new(factory);
//!
//!     let target: Arc<dyn RenderTarget> = todo!("host-environment target");
//!     let renderer: RenderFn = Arc::new(show_latest);
//!
//!     hub.setup(target, StreamConfig::new("http://localhost:9000/events"), Some(renderer))
//!         .await?;
//!
//!     // ... host lifecycle eventually calls hub.target_removed(id) and
//!     // hub.shutdown().
//!     Ok(())
//! }
//! ```

mod binding;
mod config;
mod connection;
mod consumer;
mod error;
mod history;
mod hub;
mod key;
mod payload;
mod render;
mod transport;

pub use binding::BindingHandle;
pub use config::StreamConfig;
pub use connection::{ConnectionHandle, SHARED_HISTORY_CAPACITY};
pub use consumer::{Consumer, ConsumerId};
pub use error::HubError;
pub use history::{BoundedHistory, Mode};
pub use hub::{StreamHub, TargetSetup};
pub use key::StreamKey;
pub use payload::Payload;
pub use render::{
    Render, RenderContext, RenderFn, RenderOutput, RenderTarget, TargetId, escape_html,
};
pub use transport::{
    EventTransport, HttpSseTransport, HttpTransportFactory, RawEvent, TransportFactory,
    TransportOptions,
};
