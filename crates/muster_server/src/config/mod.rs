//! Configuration: command-line arguments and the TOML settings file.

pub mod args;
pub mod settings;

pub use args::Args;
pub use settings::{Config, LoggingSettings, ServerSettings, WorldSettings};

use anyhow::Result;
use tracing::{info, warn};

/// Loads configuration from the file named in `args`, creating a default
/// file first if none exists.
pub async fn load_config(args: &Args) -> Result<Config> {
    if args.config.exists() {
        let config_str = tokio::fs::read_to_string(&args.config).await?;
        match toml::de::from_str::<Config>(&config_str) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("Failed to parse config file {}: {}", args.config.display(), e);
                Err(e.into())
            }
        }
    } else {
        warn!(
            "Configuration file not found: {}, using defaults",
            args.config.display()
        );

        let default_config = Config::default();
        let config_str = toml::to_string_pretty(&default_config)?;
        tokio::fs::write(&args.config, config_str).await?;
        info!("Created default configuration file: {}", args.config.display());

        Ok(default_config)
    }
}
