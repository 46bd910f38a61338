//! In-process front transport over bounded channels.
//!
//! Used by the integration tests and by anything embedding the broker in the
//! same process. Semantics match the TCP front: a connection mints a fresh
//! identity, inbound units get that identity prepended, outbound units are
//! looked up by their leading identity frame and delivered with it stripped.
//! Disconnecting only removes the delivery registration - the world entity
//! stays until an explicit leave event.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::trace;

use muster_protocol::{codec, DomainEvent, DomainNotification, Frames, Identity};

use super::{FrontSender, FrontTransport, InboundQueue, TransportError};

type Registry = Arc<RwLock<HashMap<Identity, mpsc::Sender<Frames>>>>;

/// Builds a channel-backed front transport and a connector for clients.
///
/// `capacity` bounds the inbound queue and each per-client outbound queue;
/// backpressure beyond that is the sender awaiting queue space.
pub fn channel_front(capacity: usize) -> (FrontTransport, ChannelConnector) {
    let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
    let registry: Registry = Arc::new(RwLock::new(HashMap::new()));

    let transport = FrontTransport {
        receiver: Box::new(InboundQueue::new(inbound_rx)),
        sender: Arc::new(ChannelSender {
            registry: registry.clone(),
        }),
    };
    let connector = ChannelConnector {
        inbound_tx,
        registry,
        capacity,
    };
    (transport, connector)
}

struct ChannelSender {
    registry: Registry,
}

#[async_trait]
impl FrontSender for ChannelSender {
    async fn deliver(&self, mut frames: Frames) {
        if frames.is_empty() {
            trace!("dropping outbound unit with no frames");
            return;
        }
        let identity = match Identity::from_wire(&frames[0]) {
            Ok(identity) => identity,
            Err(err) => {
                trace!("dropping outbound unit with unroutable identity: {err}");
                return;
            }
        };
        frames.remove(0);
        let sender = self.registry.read().await.get(&identity).cloned();
        match sender {
            Some(sender) => {
                if sender.send(frames).await.is_err() {
                    trace!(%identity, "client queue closed, dropping unit");
                }
            }
            None => trace!(%identity, "identity not connected, dropping unit"),
        }
    }
}

/// Mints new in-process client connections ("connect+external" role).
#[derive(Clone)]
pub struct ChannelConnector {
    inbound_tx: mpsc::Sender<Frames>,
    registry: Registry,
    capacity: usize,
}

impl ChannelConnector {
    /// Opens a new connection with a fresh identity.
    pub async fn connect(&self) -> ChannelClient {
        let identity = Identity::new();
        let (out_tx, out_rx) = mpsc::channel(self.capacity);
        self.registry.write().await.insert(identity, out_tx);
        ChannelClient {
            identity,
            inbound_tx: self.inbound_tx.clone(),
            outbound_rx: out_rx,
            registry: self.registry.clone(),
        }
    }
}

/// One connected in-process client.
pub struct ChannelClient {
    identity: Identity,
    inbound_tx: mpsc::Sender<Frames>,
    outbound_rx: mpsc::Receiver<Frames>,
    registry: Registry,
}

impl ChannelClient {
    /// The identity the transport assigned to this connection.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Sends raw body frames; the transport prepends this connection's
    /// identity. Exists so tests can feed the broker malformed units.
    pub async fn send_raw(&self, body: Frames) -> Result<(), TransportError> {
        let mut unit = Vec::with_capacity(body.len() + 1);
        unit.push(self.identity.to_frame());
        unit.extend(body);
        self.inbound_tx
            .send(unit)
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Sends a well-formed domain event: `[delimiter, hint, payload]`.
    pub async fn send_event(&self, event: &DomainEvent) -> Result<(), TransportError> {
        let mut body = vec![Bytes::new()];
        body.extend(codec::encode(&event.to_wire()));
        self.send_raw(body).await
    }

    /// Next delivered unit, identity already stripped:
    /// `[delimiter, hint, payload]`. `None` once the server is gone.
    pub async fn recv_unit(&mut self) -> Option<Frames> {
        self.outbound_rx.recv().await
    }

    /// Next delivered unit decoded as a domain notification.
    pub async fn recv_notification(&mut self) -> Result<Option<DomainNotification>, TransportError> {
        let Some(unit) = self.recv_unit().await else {
            return Ok(None);
        };
        let body = strip_delimiter(&unit)?;
        let message = codec::decode(body)
            .map_err(|err| TransportError::Malformed(err.to_string()))?;
        let notification = DomainNotification::from_wire(&message)
            .map_err(|err| TransportError::Malformed(err.to_string()))?;
        Ok(Some(notification))
    }

    /// Drops this connection's delivery registration. The world entity, if
    /// one was joined, stays in the store.
    pub async fn disconnect(self) {
        self.registry.write().await.remove(&self.identity);
    }
}

pub(crate) fn strip_delimiter(unit: &[Bytes]) -> Result<&[Bytes], TransportError> {
    match unit.split_first() {
        Some((delimiter, body)) if delimiter.is_empty() => Ok(body),
        Some((delimiter, _)) => Err(TransportError::Malformed(format!(
            "expected empty delimiter frame, got {} bytes",
            delimiter.len()
        ))),
        None => Err(TransportError::Malformed("empty unit".to_string())),
    }
}
