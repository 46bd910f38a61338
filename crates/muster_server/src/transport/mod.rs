//! Transport boundary: identity-addressed, message-oriented sockets.
//!
//! The broker needs four socket roles. The externally reachable front role
//! ("bind+accept") is behind the [`FrontReceiver`]/[`FrontSender`] trait pair
//! so the rest of the server never knows whether clients arrive over real TCP
//! sockets or an in-process channel. The two internal roles (relay side and
//! worker side of the pool) are the [`hub`] module. The fourth role, a
//! test/client handle ("connect+external"), ships with each front
//! implementation.
//!
//! A transport unit is an ordered sequence of opaque byte frames
//! ([`Frames`]). The front role prepends the sender's stable identity to
//! every inbound unit and strips it from every outbound one; delivery is
//! at-most-once, and units addressed to an identity that no longer maps to a
//! live connection are silently dropped.

pub mod channel;
pub mod hub;
pub mod tcp;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

pub use muster_protocol::Frames;

/// Failures at the transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer or the owning server is gone.
    #[error("transport closed")]
    Closed,

    /// Socket-level failure.
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The server sent a unit this client handle cannot interpret.
    #[error("malformed unit from server: {0}")]
    Malformed(String),
}

/// Inbound half of the front role.
///
/// Each received unit carries the sender's identity as its leading frame.
#[async_trait]
pub trait FrontReceiver: Send {
    /// Next inbound unit, or `None` once the transport is closed.
    async fn recv(&mut self) -> Option<Frames>;
}

/// Outbound half of the front role.
#[async_trait]
pub trait FrontSender: Send + Sync {
    /// Delivers a unit to the identity in its leading frame, with the
    /// identity frame stripped. Unknown or disconnected identities are a
    /// silent drop - at-most-once, no retry.
    async fn deliver(&self, frames: Frames);
}

/// A constructed front transport: the receive half plus a shareable sender.
pub struct FrontTransport {
    /// Stream of inbound units.
    pub receiver: Box<dyn FrontReceiver>,
    /// Outbound delivery handle.
    pub sender: Arc<dyn FrontSender>,
}

/// [`FrontReceiver`] over a plain bounded queue. Both shipped transports
/// funnel their inbound units through one of these.
pub(crate) struct InboundQueue {
    rx: mpsc::Receiver<Frames>,
}

impl InboundQueue {
    pub(crate) fn new(rx: mpsc::Receiver<Frames>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl FrontReceiver for InboundQueue {
    async fn recv(&mut self) -> Option<Frames> {
        self.rx.recv().await
    }
}
