//! One registered subscription on a shared connection.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use crate::payload::Payload;
use crate::render::{RenderContext, RenderFn, RenderTarget};

/// Unique identifier for a consumer, allocated by the hub.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct ConsumerId(pub u64);

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consumer-{}", self.0)
    }
}

/// A UI target registered on a shared stream connection, with its own
/// window into the shared history and its own render callback.
pub struct Consumer {
    pub id: ConsumerId,
    pub target: Arc<dyn RenderTarget>,
    /// How many of the newest history items this consumer sees. Independent
    /// of the connection's retention capacity.
    pub window: usize,
    renderer: RenderFn,
    deliveries: u64,
}

impl Consumer {
    pub fn new(id: ConsumerId, target: Arc<dyn RenderTarget>, window: usize, renderer: RenderFn) -> Self {
        Self {
            id,
            target,
            window,
            renderer,
            deliveries: 0,
        }
    }

    /// Deliver one history snapshot: slice to the newest `window` items
    /// (oldest-first order preserved) and run the render callback.
    ///
    /// Never lets a callback failure escape — an erroring renderer is logged
    /// and the target's previous content stays intact.
    pub fn deliver(&mut self, history: &[Payload]) {
        let start = history.len().saturating_sub(self.window);
        let slice = &history[start..];

        self.deliveries += 1;
        let ctx = RenderContext {
            window: self.window,
            history_len: history.len(),
            deliveries: self.deliveries,
        };

        match self.renderer.render(slice, self.target.as_ref(), &ctx) {
            Ok(Some(output)) => self.target.set_content(&output.into_markup()),
            Ok(None) => {
                debug!("{} rendered in place", self.id);
            }
            Err(e) => {
                error!("render error on {}: {:#}", self.id, e);
            }
        }
    }
}
