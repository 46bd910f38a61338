//! Relay: pass-through bridge between the front tier and the worker pool.
//!
//! Both directions preserve the full envelope shape, identity frame
//! included, and never look at the payload. The tier exists so worker count
//! scales independently of accepted connections and the front never touches
//! business logic. Malformed shapes get the same drop-and-log treatment as
//! everywhere else.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use muster_protocol::Envelope;

use crate::transport::hub::WorkerHub;
use crate::transport::Frames;

/// The middle tier. Downstream it deals validated client units to the hub;
/// upstream it forwards worker-produced units to the front.
pub struct Relay {
    from_front: mpsc::Receiver<Frames>,
    hub: WorkerHub,
    from_workers: mpsc::Receiver<Frames>,
    to_front: mpsc::Sender<Frames>,
}

impl Relay {
    /// Wires the relay between the front queues and the worker hub.
    pub fn new(
        from_front: mpsc::Receiver<Frames>,
        hub: WorkerHub,
        from_workers: mpsc::Receiver<Frames>,
        to_front: mpsc::Sender<Frames>,
    ) -> Self {
        Self {
            from_front,
            hub,
            from_workers,
            to_front,
        }
    }

    /// Pumps both directions until the queues close or shutdown fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let Relay {
            mut from_front,
            hub,
            mut from_workers,
            to_front,
        } = self;

        let downstream = async move {
            while let Some(frames) = from_front.recv().await {
                match Envelope::validate(&frames) {
                    Ok(()) => hub.dispatch(frames).await,
                    Err(err) => warn!("relay dropping malformed downstream unit: {err}"),
                }
            }
        };
        let upstream = async move {
            while let Some(frames) = from_workers.recv().await {
                match Envelope::validate(&frames) {
                    Ok(()) => {
                        if to_front.send(frames).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("relay dropping malformed upstream unit: {err}"),
                }
            }
        };

        tokio::select! {
            _ = async { tokio::join!(downstream, upstream) } => {}
            _ = shutdown.recv() => debug!("relay stopping on shutdown"),
        }
    }
}
