//! Configuration settings structures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration object, serialized to/from TOML.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Broker and networking settings.
    pub server: ServerSettings,
    /// World store policy settings.
    pub world: WorldSettings,
    /// Optional logging configuration.
    pub logging: Option<LoggingSettings>,
}

/// Broker configuration.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerSettings {
    /// Address the front listener binds to.
    ///
    /// Format: "IP:PORT".
    pub listen_addr: String,

    /// Number of worker instances in the pool.
    ///
    /// More workers means more dispatch parallelism, but per-client event
    /// ordering is only strict with a single worker.
    pub workers: usize,

    /// Capacity of every bounded queue in the broker. Backpressure beyond
    /// this is the transport's problem.
    pub queue_capacity: usize,
}

/// World store policy.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WorldSettings {
    /// Smallest acceptable position; moves below it are ignored.
    pub min_x: f64,
    /// Largest acceptable position; moves above it are ignored.
    pub max_x: f64,
    /// JSON snapshot file, loaded at startup and saved on shutdown.
    /// Omit for a purely in-memory world.
    pub snapshot_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingSettings {
    /// Logging level filter: "trace", "debug", "info", "warn" or "error".
    pub level: String,

    /// Emit structured JSON logs instead of human-readable ones.
    pub json_format: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                listen_addr: "127.0.0.1:4117".to_string(),
                workers: num_cpus::get(),
                queue_capacity: 1024,
            },
            world: WorldSettings {
                min_x: -1000.0,
                max_x: 1000.0,
                snapshot_path: None,
            },
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            }),
        }
    }
}
