//! Front router: the externally bound rendezvous point.
//!
//! Inbound units from the transport are shape-checked and forwarded to the
//! relay verbatim; anything malformed is logged and dropped so bad input
//! never travels downstream. Outbound units coming back from the relay are
//! handed to the transport unmodified - the transport picks the destination
//! connection from the leading identity frame and silently drops units
//! addressed to identities that are no longer live.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use muster_protocol::Envelope;

use crate::transport::{Frames, FrontTransport};

/// The front tier, wrapping the external transport.
pub struct FrontRouter {
    transport: FrontTransport,
    to_relay: mpsc::Sender<Frames>,
    from_relay: mpsc::Receiver<Frames>,
}

impl FrontRouter {
    /// Wires the router between the transport and the relay queues.
    pub fn new(
        transport: FrontTransport,
        to_relay: mpsc::Sender<Frames>,
        from_relay: mpsc::Receiver<Frames>,
    ) -> Self {
        Self {
            transport,
            to_relay,
            from_relay,
        }
    }

    /// Pumps both directions until the transport or relay closes, or
    /// shutdown fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let FrontRouter {
            transport,
            to_relay,
            mut from_relay,
        } = self;
        let mut receiver = transport.receiver;
        let sender = transport.sender;

        let inbound = async move {
            while let Some(frames) = receiver.recv().await {
                match Envelope::validate(&frames) {
                    Ok(()) => {
                        if to_relay.send(frames).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("front dropping malformed envelope: {err}"),
                }
            }
        };
        let outbound = async move {
            while let Some(frames) = from_relay.recv().await {
                sender.deliver(frames).await;
            }
        };

        // Either pump ending means the router cannot make progress anymore:
        // a closed transport has nobody left to deliver to, and a closed
        // relay has nobody left to forward to. Racing them (instead of
        // joining) lets the caller tear the remaining tiers down.
        tokio::select! {
            _ = inbound => debug!("front router stopping: transport closed"),
            _ = outbound => debug!("front router stopping: relay closed"),
            _ = shutdown.recv() => debug!("front router stopping on shutdown"),
        }
    }
}
