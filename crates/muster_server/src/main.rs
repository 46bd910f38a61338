//! Muster coordination server - main entry point.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use muster_server::config::{self, Args, Config};
use muster_server::transport::tcp::tcp_front;
use muster_server::world::memory::{MemoryWorldStore, WorldBounds};
use muster_server::world::WorldStore;
use muster_server::{logging, shutdown, MusterServer, ServerError};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = config::load_config(&args).await?;
    logging::setup_logging(&args, config.logging.as_ref())?;

    info!("Starting Muster coordination server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config.display());

    let listen_addr = resolve_listen_addr(&config, &args)?;
    let workers = args.workers.unwrap_or(config.server.workers);

    let bounds = WorldBounds {
        min_x: config.world.min_x,
        max_x: config.world.max_x,
    };
    let store = match &config.world.snapshot_path {
        Some(path) => Arc::new(MemoryWorldStore::with_snapshot(bounds, path).await?),
        None => Arc::new(MemoryWorldStore::new(bounds)),
    };

    let (transport, bound_addr) = tcp_front(listen_addr, config.server.queue_capacity)
        .await
        .map_err(ServerError::from)?;
    let server = Arc::new(MusterServer::new(
        store.clone() as Arc<dyn WorldStore>,
        workers,
        config.server.queue_capacity,
    ));

    info!("Server configuration:");
    info!("  Listen address: {bound_addr}");
    info!("  Workers: {workers}");
    info!("  Queue capacity: {}", config.server.queue_capacity);
    info!(
        "  World bounds: [{}, {}]",
        config.world.min_x, config.world.max_x
    );

    let shutdown_receiver = shutdown::setup_shutdown_handler().await;

    tokio::select! {
        result = server.run(transport) => {
            match result {
                Ok(()) => info!("Server stopped normally"),
                Err(e) => {
                    error!("Server error: {e}");
                    return Err(e.into());
                }
            }
        }
        _ = shutdown_receiver => {
            info!("Shutdown signal received");
            server.shutdown().await;
        }
    }

    if let Some(path) = &config.world.snapshot_path {
        if let Err(e) = store.save_snapshot(path).await {
            error!("Failed to save world snapshot: {e}");
        }
    }

    Ok(())
}

fn resolve_listen_addr(config: &Config, args: &Args) -> Result<SocketAddr> {
    args.listen
        .as_deref()
        .unwrap_or(&config.server.listen_addr)
        .parse()
        .map_err(|e| anyhow::anyhow!("Failed to parse listen address: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_listen_addr_prefers_the_flag() {
        let config = Config::default();
        let args = Args {
            listen: Some("0.0.0.0:9090".to_string()),
            ..Default::default()
        };
        let addr = resolve_listen_addr(&config, &args).unwrap();
        assert_eq!(addr, "0.0.0.0:9090".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn resolve_listen_addr_falls_back_to_config() {
        let config = Config::default();
        let args = Args::default();
        let addr = resolve_listen_addr(&config, &args).unwrap();
        assert_eq!(addr, "127.0.0.1:4117".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn resolve_listen_addr_rejects_garbage() {
        let config = Config::default();
        let args = Args {
            listen: Some("not-an-address".to_string()),
            ..Default::default()
        };
        assert!(resolve_listen_addr(&config, &args).is_err());
    }
}
