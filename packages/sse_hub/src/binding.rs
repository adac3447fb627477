//! Direct binding: the non-shared path used when no render callback exists.
//!
//! Payloads are treated as ready-to-insert fragments. The binding owns its
//! own transport and its own history of rendered fragments, and keeps the
//! history length equal to the number of fragments attached to the target:
//! every eviction detaches the opposite-end child in the same step.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::StreamConfig;
use crate::error::HubError;
use crate::history::{BoundedHistory, Mode};
use crate::render::{RenderTarget, escape_html};
use crate::transport::{EventTransport, RawEvent};

pub(crate) enum BindingMessage {
    Close { respond_to: oneshot::Sender<()> },
}

/// Handle to a running direct binding.
#[derive(Clone)]
pub struct BindingHandle {
    sender: mpsc::Sender<BindingMessage>,
}

impl BindingHandle {
    pub(crate) async fn close(&self) -> Result<(), HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BindingMessage::Close { respond_to: tx })
            .await
            .map_err(|_| HubError::ChannelClosed("binding close".into()))?;
        rx.await
            .map_err(|_| HubError::ChannelClosed("binding close reply".into()))
    }
}

pub(crate) struct DirectBinding {
    target: Arc<dyn RenderTarget>,
    transport: Arc<dyn EventTransport>,
    events: broadcast::Receiver<RawEvent>,
    history: BoundedHistory<String>,
    mode: Mode,
    escape_output: bool,
    receiver: mpsc::Receiver<BindingMessage>,
}

impl DirectBinding {
    pub(crate) fn spawn(
        target: Arc<dyn RenderTarget>,
        transport: Arc<dyn EventTransport>,
        config: &StreamConfig,
    ) -> BindingHandle {
        let events = transport.events(&config.event);
        let (msg_tx, msg_rx) = mpsc::channel(32);

        let mut binding = Self {
            target,
            transport,
            events,
            history: BoundedHistory::new(config.cache_size),
            mode: config.mode,
            escape_output: config.escape_output,
            receiver: msg_rx,
        };

        binding.seed();
        tokio::spawn(binding.run());

        BindingHandle { sender: msg_tx }
    }

    /// Adopt whatever fragments already sit on the target. Pre-existing
    /// children count toward capacity immediately, so over-capacity ones are
    /// detached right here.
    fn seed(&mut self) {
        let mut children = self.target.children();
        while children.len() > self.history.capacity() {
            match self.mode {
                Mode::Append => {
                    children.remove(0);
                    self.target.remove_first_child();
                }
                Mode::Prepend => {
                    children.pop();
                    self.target.remove_last_child();
                }
            }
        }
        for fragment in children {
            self.history.push(fragment, Mode::Append);
        }
        debug!(
            "{}: direct binding seeded with {} fragments",
            self.target.id(),
            self.history.len()
        );
    }

    async fn run(mut self) {
        info!("{}: direct binding open", self.target.id());

        loop {
            tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(BindingMessage::Close { respond_to }) => {
                        let _ = respond_to.send(());
                        break;
                    }
                    None => break,
                },
                event = self.events.recv() => match event {
                    Ok(raw) => self.handle_event(raw),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            "{}: event receiver lagged, {} fragments skipped",
                            self.target.id(),
                            skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        self.transport.close();
        info!("{}: direct binding closed", self.target.id());
    }

    /// Insert one fragment at the configured end and record it. Attach and
    /// push happen together; an eviction detaches the opposite-end child in
    /// the same step, so child count never exceeds capacity.
    fn handle_event(&mut self, raw: RawEvent) {
        let fragment = if self.escape_output {
            format!("<pre>{}</pre>", escape_html(&raw.data))
        } else {
            raw.data
        };

        match self.mode {
            Mode::Append => {
                self.target.append_child(&fragment);
                if self.history.push(fragment, Mode::Append).is_some() {
                    self.target.remove_first_child();
                }
            }
            Mode::Prepend => {
                self.target.prepend_child(&fragment);
                if self.history.push(fragment, Mode::Prepend).is_some() {
                    self.target.remove_last_child();
                }
            }
        }
    }
}
