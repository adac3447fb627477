//! A shared stream connection: one transport, one history, many consumers.
//!
//! Each connection runs as its own task owning all mutable state. Control
//! messages (subscribe, unsubscribe, close) and transport events are handled
//! strictly in turn, so per-connection delivery order is arrival order and no
//! consumer can ever observe the history mid-mutation.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::consumer::{Consumer, ConsumerId};
use crate::error::HubError;
use crate::history::{BoundedHistory, Mode};
use crate::key::StreamKey;
use crate::payload::Payload;
use crate::transport::{EventTransport, RawEvent};

/// Retention ceiling for a shared connection's history, independent of any
/// consumer's window.
pub const SHARED_HISTORY_CAPACITY: usize = 1000;

pub(crate) enum ConnectionMessage {
    Subscribe {
        consumer: Consumer,
        respond_to: oneshot::Sender<()>,
    },
    Unsubscribe {
        id: ConsumerId,
        respond_to: oneshot::Sender<usize>,
    },
    ConsumerCount {
        respond_to: oneshot::Sender<usize>,
    },
    Snapshot {
        respond_to: oneshot::Sender<Vec<Payload>>,
    },
    Close {
        respond_to: oneshot::Sender<()>,
    },
}

/// Handle to a running connection actor.
#[derive(Clone)]
pub struct ConnectionHandle {
    sender: mpsc::Sender<ConnectionMessage>,
}

impl ConnectionHandle {
    /// Register a consumer. The current history snapshot is delivered to it
    /// before this returns — late joiners see the backlog immediately.
    pub(crate) async fn subscribe(&self, consumer: Consumer) -> Result<(), HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ConnectionMessage::Subscribe {
                consumer,
                respond_to: tx,
            })
            .await
            .map_err(|_| HubError::ChannelClosed("subscribe".into()))?;
        rx.await
            .map_err(|_| HubError::ChannelClosed("subscribe reply".into()))
    }

    /// Remove a consumer; returns how many remain.
    pub(crate) async fn unsubscribe(&self, id: ConsumerId) -> Result<usize, HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ConnectionMessage::Unsubscribe { id, respond_to: tx })
            .await
            .map_err(|_| HubError::ChannelClosed("unsubscribe".into()))?;
        rx.await
            .map_err(|_| HubError::ChannelClosed("unsubscribe reply".into()))
    }

    pub async fn consumer_count(&self) -> Result<usize, HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ConnectionMessage::ConsumerCount { respond_to: tx })
            .await
            .map_err(|_| HubError::ChannelClosed("consumer count".into()))?;
        rx.await
            .map_err(|_| HubError::ChannelClosed("consumer count reply".into()))
    }

    /// Immutable copy of the connection's current history.
    pub async fn snapshot(&self) -> Result<Vec<Payload>, HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ConnectionMessage::Snapshot { respond_to: tx })
            .await
            .map_err(|_| HubError::ChannelClosed("snapshot".into()))?;
        rx.await
            .map_err(|_| HubError::ChannelClosed("snapshot reply".into()))
    }

    /// Close the transport and end the actor. Idempotent at the transport
    /// level; callers go through the hub, which owns the lifecycle.
    pub(crate) async fn close(&self) -> Result<(), HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ConnectionMessage::Close { respond_to: tx })
            .await
            .map_err(|_| HubError::ChannelClosed("close".into()))?;
        rx.await
            .map_err(|_| HubError::ChannelClosed("close reply".into()))
    }
}

pub(crate) struct ConnectionActor {
    key: StreamKey,
    transport: Arc<dyn EventTransport>,
    events: broadcast::Receiver<RawEvent>,
    history: BoundedHistory<Payload>,
    consumers: Vec<Consumer>,
    receiver: mpsc::Receiver<ConnectionMessage>,
}

impl ConnectionActor {
    /// Wire a message handler onto the transport and start the actor task.
    pub(crate) fn spawn(
        key: StreamKey,
        transport: Arc<dyn EventTransport>,
        capacity: usize,
    ) -> ConnectionHandle {
        let events = transport.events(&key.event);
        let (msg_tx, msg_rx) = mpsc::channel(32);

        let actor = Self {
            key,
            transport,
            events,
            history: BoundedHistory::new(capacity),
            consumers: Vec::new(),
            receiver: msg_rx,
        };

        tokio::spawn(actor.run());

        ConnectionHandle { sender: msg_tx }
    }

    async fn run(mut self) {
        info!("stream connection open: {}", self.key);
        let mut events_open = true;

        loop {
            tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(msg) => {
                        if self.handle_message(msg) {
                            break;
                        }
                    }
                    None => break,
                },
                event = self.events.recv(), if events_open => match event {
                    Ok(raw) => self.handle_event(raw),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("{}: event receiver lagged, {} messages skipped", self.key, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        // Terminal close from the transport side. The
                        // connection stays registered; reconnection, if any,
                        // is the transport's own business.
                        info!("{}: transport event stream ended", self.key);
                        events_open = false;
                    }
                },
            }
        }

        self.transport.close();
        info!("stream connection closed: {}", self.key);
    }

    /// Returns `true` when the actor should stop.
    fn handle_message(&mut self, msg: ConnectionMessage) -> bool {
        match msg {
            ConnectionMessage::Subscribe {
                mut consumer,
                respond_to,
            } => {
                debug!("{} joins {}", consumer.id, self.key);
                consumer.deliver(&self.history.snapshot());
                self.consumers.push(consumer);
                let _ = respond_to.send(());
                false
            }
            ConnectionMessage::Unsubscribe { id, respond_to } => {
                self.consumers.retain(|c| c.id != id);
                debug!("{} leaves {}, {} remain", id, self.key, self.consumers.len());
                let _ = respond_to.send(self.consumers.len());
                false
            }
            ConnectionMessage::ConsumerCount { respond_to } => {
                let _ = respond_to.send(self.consumers.len());
                false
            }
            ConnectionMessage::Snapshot { respond_to } => {
                let _ = respond_to.send(self.history.snapshot());
                false
            }
            ConnectionMessage::Close { respond_to } => {
                let _ = respond_to.send(());
                true
            }
        }
    }

    /// Decode, record, fan out. Delivery goes to every consumer registered
    /// at the start of the fan-out; one consumer failing (handled inside
    /// [`Consumer::deliver`]) never blocks the rest.
    fn handle_event(&mut self, raw: RawEvent) {
        let payload = Payload::decode(&raw.data);
        if matches!(payload, Payload::Text(_)) && raw.data.starts_with(['{', '[']) {
            debug!("{}: payload kept as raw text after failed decode", self.key);
        }

        self.history.push(payload, Mode::Append);

        let snapshot = self.history.snapshot();
        for consumer in &mut self.consumers {
            consumer.deliver(&snapshot);
        }
    }
}
