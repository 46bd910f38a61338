//! Command-line argument parsing.
//!
//! Arguments override configuration file settings; everything has a
//! file-backed default so `muster` runs with no flags at all.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Muster coordination server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path.
    ///
    /// If the file does not exist, a default configuration is written there.
    #[arg(short, long, default_value = "muster.toml")]
    pub config: PathBuf,

    /// Override the listen address from the configuration file.
    ///
    /// Format: "IP:PORT" (e.g. "127.0.0.1:4117" or "0.0.0.0:4117").
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Override the worker-pool size from the configuration file.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub debug: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: PathBuf::from("muster.toml"),
            listen: None,
            workers: None,
            debug: false,
        }
    }
}
