//! Process-wide registry of shared stream connections and target bindings.
//!
//! The hub is the only owner of connection handles and the only component
//! allowed to close them. Targets come and go; connections are created on
//! first subscription for a key and torn down when their last consumer
//! leaves, or all at once on shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::binding::{BindingHandle, DirectBinding};
use crate::config::StreamConfig;
use crate::connection::{ConnectionActor, ConnectionHandle, SHARED_HISTORY_CAPACITY};
use crate::consumer::{Consumer, ConsumerId};
use crate::error::HubError;
use crate::key::StreamKey;
use crate::render::{RenderFn, RenderTarget, TargetId};
use crate::transport::{TransportFactory, TransportOptions};

/// Everything needed to configure one UI target: the opaque target itself,
/// its configuration record, and an optional injected render callback.
pub struct TargetSetup {
    pub target: Arc<dyn RenderTarget>,
    pub config: StreamConfig,
    pub renderer: Option<RenderFn>,
}

/// How a configured target is wired up.
enum Attachment {
    /// Consumer on a shared connection.
    Shared {
        key: StreamKey,
        consumer: ConsumerId,
    },
    /// Dedicated transport streaming fragments straight into the target.
    Direct { handle: BindingHandle },
}

/// Registry and sole lifecycle owner of stream connections.
pub struct StreamHub {
    factory: Arc<dyn TransportFactory>,
    connections: RwLock<HashMap<StreamKey, ConnectionHandle>>,
    attachments: RwLock<HashMap<TargetId, Attachment>>,
    next_consumer_id: AtomicU64,
    shared_capacity: usize,
}

impl StreamHub {
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            factory,
            connections: RwLock::new(HashMap::new()),
            attachments: RwLock::new(HashMap::new()),
            next_consumer_id: AtomicU64::new(1),
            shared_capacity: SHARED_HISTORY_CAPACITY,
        }
    }

    /// Override the retention ceiling used by shared connections.
    pub fn with_shared_capacity(mut self, capacity: usize) -> Self {
        self.shared_capacity = capacity;
        self
    }

    /// Configure one target. Idempotent: a target that is already attached
    /// is left exactly as it is.
    ///
    /// With a renderer the target joins (or creates) the shared connection
    /// for its key and immediately receives the history backlog. Without one
    /// it gets a dedicated direct binding. Only configuration and
    /// transport-construction errors surface; nothing is registered when
    /// they do.
    pub async fn setup(
        &self,
        target: Arc<dyn RenderTarget>,
        config: StreamConfig,
        renderer: Option<RenderFn>,
    ) -> Result<(), HubError> {
        let target_id = target.id();
        {
            let attachments = self.attachments.read().await;
            if attachments.contains_key(&target_id) {
                debug!("{} already configured, setup is a no-op", target_id);
                return Ok(());
            }
        }

        config.validate()?;
        let options = TransportOptions {
            with_credentials: config.with_credentials,
        };

        let attachment = match renderer {
            Some(renderer) => {
                let key = config.key();
                let connection = self.get_or_create(&key, options).await?;
                let id = ConsumerId(self.next_consumer_id.fetch_add(1, Ordering::SeqCst));
                let consumer = Consumer::new(id, target, config.cache_size, renderer);
                connection.subscribe(consumer).await?;
                Attachment::Shared { key, consumer: id }
            }
            None => {
                let transport = self.factory.open(&config.url, options)?;
                let handle = DirectBinding::spawn(target, transport, &config);
                Attachment::Direct { handle }
            }
        };

        self.attachments.write().await.insert(target_id, attachment);
        Ok(())
    }

    /// Configure every supplied target. A target that fails stays
    /// unconfigured; the rest still go through.
    pub async fn init_all(&self, setups: impl IntoIterator<Item = TargetSetup>) {
        for setup in setups {
            let id = setup.target.id();
            if let Err(e) = self.setup(setup.target, setup.config, setup.renderer).await {
                error!("setup failed for {}: {}", id, e);
            }
        }
    }

    /// External "target removed" notification. Detaches the target; a shared
    /// connection left with no consumers is closed and dropped from the
    /// registry.
    pub async fn target_removed(&self, id: TargetId) -> Result<(), HubError> {
        let attachment = self.attachments.write().await.remove(&id);
        match attachment {
            None => {
                debug!("{} was not configured, nothing to remove", id);
                Ok(())
            }
            Some(Attachment::Direct { handle }) => handle.close().await,
            Some(Attachment::Shared { key, consumer }) => {
                let mut connections = self.connections.write().await;
                let Some(connection) = connections.get(&key) else {
                    return Ok(());
                };
                let remaining = connection.unsubscribe(consumer).await?;
                if remaining == 0 {
                    info!("last consumer left {}, closing", key);
                    let connection = connections.remove(&key);
                    drop(connections);
                    if let Some(connection) = connection {
                        connection.close().await?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Process-exit teardown: close every connection and binding still
    /// registered, whatever their consumer count.
    pub async fn shutdown(&self) {
        let connections: Vec<_> = self.connections.write().await.drain().collect();
        for (key, connection) in connections {
            if let Err(e) = connection.close().await {
                error!("closing {} during shutdown: {}", key, e);
            }
        }

        let attachments: Vec<_> = self.attachments.write().await.drain().collect();
        for (id, attachment) in attachments {
            if let Attachment::Direct { handle } = attachment {
                if let Err(e) = handle.close().await {
                    error!("closing binding for {} during shutdown: {}", id, e);
                }
            }
        }
        info!("stream hub shut down");
    }

    /// Number of live shared connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Handle for the shared connection under `key`, if one is open.
    pub async fn connection(&self, key: &StreamKey) -> Option<ConnectionHandle> {
        self.connections.read().await.get(key).cloned()
    }

    async fn get_or_create(
        &self,
        key: &StreamKey,
        options: TransportOptions,
    ) -> Result<ConnectionHandle, HubError> {
        let mut connections = self.connections.write().await;
        if let Some(existing) = connections.get(key) {
            return Ok(existing.clone());
        }

        let transport = self.factory.open(&key.url, options)?;
        let handle = ConnectionActor::spawn(key.clone(), transport, self.shared_capacity);
        connections.insert(key.clone(), handle.clone());
        Ok(handle)
    }
}
