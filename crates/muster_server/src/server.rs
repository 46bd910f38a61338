//! Server orchestration: wires the broker tiers together and runs them.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

use crate::broker::{spawn_supervised_worker, FrontRouter, Relay};
use crate::error::ServerError;
use crate::transport::hub::WorkerHub;
use crate::transport::FrontTransport;
use crate::world::WorldStore;

/// The coordination server: front router, relay, and a supervised worker
/// pool over one shared world store.
///
/// All tiers are explicitly constructed and connected by bounded queues -
/// no globals - so tests run the whole broker over the in-process channel
/// transport.
pub struct MusterServer {
    store: Arc<dyn WorldStore>,
    workers: usize,
    queue_capacity: usize,
    shutdown_sender: broadcast::Sender<()>,
}

impl MusterServer {
    /// Creates a server over `store` with a pool of `workers` instances.
    pub fn new(store: Arc<dyn WorldStore>, workers: usize, queue_capacity: usize) -> Self {
        let (shutdown_sender, _) = broadcast::channel(1);
        Self {
            store,
            workers,
            queue_capacity,
            shutdown_sender,
        }
    }

    /// Runs the broker over the given front transport until shutdown.
    ///
    /// Spawns the relay and the supervised workers, then drives the front
    /// router on this task. Returns once [`shutdown`](Self::shutdown) is
    /// called or the transport closes.
    pub async fn run(&self, transport: FrontTransport) -> Result<(), ServerError> {
        if self.workers == 0 {
            return Err(ServerError::Config(
                "worker pool size must be at least 1".to_string(),
            ));
        }

        info!(
            workers = self.workers,
            queue_capacity = self.queue_capacity,
            "starting broker"
        );

        let (to_relay, from_front) = mpsc::channel(self.queue_capacity);
        let (to_front, from_relay) = mpsc::channel(self.queue_capacity);
        let (hub, from_workers) = WorkerHub::new(self.queue_capacity);

        let mut handles = Vec::with_capacity(self.workers + 1);
        handles.push(tokio::spawn(
            Relay::new(from_front, hub.clone(), from_workers, to_front)
                .run(self.shutdown_sender.subscribe()),
        ));
        for id in 0..self.workers {
            handles.push(spawn_supervised_worker(
                id,
                hub.clone(),
                self.store.clone(),
                self.shutdown_sender.subscribe(),
            ));
        }
        // The server's own hub handle would keep worker queues open forever.
        drop(hub);

        FrontRouter::new(transport, to_relay, from_relay)
            .run(self.shutdown_sender.subscribe())
            .await;

        // Router finished: either shutdown fired or the transport closed.
        // Stop the remaining tiers either way.
        let _ = self.shutdown_sender.send(());
        futures::future::join_all(handles).await;
        info!("broker stopped");
        Ok(())
    }

    /// Signals every tier to stop. Idempotent.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_sender.send(());
    }
}
