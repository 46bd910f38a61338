//! Worker hub: the internal transport between relay and worker pool.
//!
//! The hub is the "bind+internal" role; each worker obtains a socket through
//! [`WorkerHub::connect`] ("connect+internal"). Downstream units are dealt
//! round-robin across the connected workers, which is the whole
//! load-distribution scheme - no partitioning, so two units from one client
//! may land on different workers. Upstream units from every worker funnel
//! into a single queue the relay drains.
//!
//! Sockets whose worker has died are pruned on the next dispatch, so a
//! restarting worker drops only the units already queued to its old socket.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

use super::Frames;

struct Pool {
    senders: Vec<mpsc::Sender<Frames>>,
    next: usize,
}

/// Bind side of the internal transport. Cheap to clone; all clones share the
/// same worker pool.
#[derive(Clone)]
pub struct WorkerHub {
    pool: Arc<Mutex<Pool>>,
    upstream_tx: mpsc::Sender<Frames>,
    capacity: usize,
}

impl WorkerHub {
    /// Creates the hub plus the upstream queue the relay reads
    /// worker-produced units from.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Frames>) {
        let (upstream_tx, upstream_rx) = mpsc::channel(capacity);
        let hub = Self {
            pool: Arc::new(Mutex::new(Pool {
                senders: Vec::new(),
                next: 0,
            })),
            upstream_tx,
            capacity,
        };
        (hub, upstream_rx)
    }

    /// Connects a new worker socket to the pool.
    pub async fn connect(&self) -> WorkerSocket {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.pool.lock().await.senders.push(tx);
        WorkerSocket {
            inbound: rx,
            upstream: self.upstream_tx.clone(),
        }
    }

    /// Deals a unit to the next live worker, round-robin. With no live
    /// workers the unit is dropped with a warning - at-most-once holds here
    /// too.
    pub async fn dispatch(&self, frames: Frames) {
        let sender = {
            let mut pool = self.pool.lock().await;
            pool.senders.retain(|s| !s.is_closed());
            if pool.senders.is_empty() {
                warn!("no workers connected, dropping unit");
                return;
            }
            let index = pool.next % pool.senders.len();
            pool.next = pool.next.wrapping_add(1);
            pool.senders[index].clone()
        };
        if sender.send(frames).await.is_err() {
            warn!("worker socket closed mid-dispatch, dropping unit");
        }
    }

    /// Number of currently live worker sockets.
    pub async fn connected_workers(&self) -> usize {
        let mut pool = self.pool.lock().await;
        pool.senders.retain(|s| !s.is_closed());
        pool.senders.len()
    }
}

/// Connect side of the internal transport, owned by one worker instance.
pub struct WorkerSocket {
    inbound: mpsc::Receiver<Frames>,
    upstream: mpsc::Sender<Frames>,
}

impl WorkerSocket {
    /// Next unit dealt to this worker, or `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Frames> {
        self.inbound.recv().await
    }

    /// Sends an outbound unit back toward the relay.
    pub async fn send(&self, frames: Frames) -> Result<(), super::TransportError> {
        self.upstream
            .send(frames)
            .await
            .map_err(|_| super::TransportError::Closed)
    }
}
