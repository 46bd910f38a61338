//! Convenience constructors.

use std::sync::Arc;

use crate::config::Config;
use crate::server::MusterServer;
use crate::world::memory::{MemoryWorldStore, WorldBounds};
use crate::world::WorldStore;

/// Server over a fresh in-memory world with default pool sizing.
pub fn create_server() -> MusterServer {
    create_server_with_config(&Config::default())
}

/// Server over a fresh in-memory world, sized per `config`.
pub fn create_server_with_config(config: &Config) -> MusterServer {
    let store: Arc<dyn WorldStore> = Arc::new(MemoryWorldStore::new(WorldBounds {
        min_x: config.world.min_x,
        max_x: config.world.max_x,
    }));
    MusterServer::new(store, config.server.workers, config.server.queue_capacity)
}
