//! Worker: the only tier that decodes payloads and touches the domain.
//!
//! Each instance drains its hub socket sequentially: validate the envelope,
//! decode the body, map the hint to an event, dispatch, and send one
//! envelope back per `(destination, notification)` pair. Malformed wire
//! input never escapes this loop - it is logged and dropped. A store error
//! does escape, on purpose: the supervisor logs it, discards the instance,
//! and connects a fresh one to the hub, leaving the other workers and the
//! router/relay untouched.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use muster_protocol::{codec, DomainEvent, Envelope};

use crate::transport::hub::{WorkerHub, WorkerSocket};
use crate::world::{StoreError, WorldStore};

use super::dispatch::dispatch;

/// One worker instance bound to a hub socket.
pub struct Worker {
    id: usize,
    socket: WorkerSocket,
    store: Arc<dyn WorldStore>,
}

impl Worker {
    /// Wraps a connected hub socket. `id` only labels log lines.
    pub fn new(id: usize, socket: WorkerSocket, store: Arc<dyn WorldStore>) -> Self {
        Self { id, socket, store }
    }

    /// Processes units until the hub closes. Returns `Err` only for domain
    /// operation failures, which end this instance.
    pub async fn run(mut self) -> Result<(), StoreError> {
        while let Some(frames) = self.socket.recv().await {
            let envelope = match Envelope::from_frames(frames) {
                Ok(envelope) => envelope,
                Err(err) => {
                    warn!(worker = self.id, "dropping malformed envelope: {err}");
                    continue;
                }
            };
            let sender = envelope.identity();

            let message = match codec::decode(envelope.body()) {
                Ok(message) => message,
                Err(err) => {
                    warn!(worker = self.id, %sender, "dropping malformed payload: {err}");
                    continue;
                }
            };
            let event = match DomainEvent::from_wire(&message) {
                Ok(event) => event,
                Err(err) => {
                    warn!(worker = self.id, %sender, "dropping undecodable event: {err}");
                    continue;
                }
            };

            debug!(worker = self.id, %sender, ?event, "dispatching");
            let outbound = dispatch(self.store.as_ref(), sender, event).await?;

            for (destination, notification) in outbound {
                let envelope = Envelope::new(destination, codec::encode(&notification.to_wire()));
                if self.socket.send(envelope.into_frames()).await.is_err() {
                    // Upstream gone means the broker is shutting down.
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

/// Runs worker `id` under a respawn supervisor.
///
/// The supervisor connects a socket, runs the instance to completion, and
/// decides: clean end (hub closed) stops it; a store error or a panic gets a
/// fresh instance with a new socket and no carried state. The shutdown
/// broadcast aborts whatever is running.
pub fn spawn_supervised_worker(
    id: usize,
    hub: WorkerHub,
    store: Arc<dyn WorldStore>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut generation = 0usize;
        loop {
            let socket = hub.connect().await;
            let worker = Worker::new(id, socket, store.clone());
            let mut handle = tokio::spawn(worker.run());

            tokio::select! {
                result = &mut handle => match result {
                    Ok(Ok(())) => {
                        debug!(worker = id, "worker stopped cleanly");
                        break;
                    }
                    Ok(Err(err)) => {
                        generation += 1;
                        error!(worker = id, generation, "worker failed, respawning: {err}");
                    }
                    Err(join_err) if join_err.is_panic() => {
                        generation += 1;
                        error!(worker = id, generation, "worker panicked, respawning");
                    }
                    Err(_) => break,
                },
                _ = shutdown.recv() => {
                    handle.abort();
                    break;
                }
            }
        }
    })
}
