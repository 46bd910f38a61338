//! Logging system setup.
//!
//! Structured logging via tracing, with the filter resolved in order:
//! `RUST_LOG` environment variable, then `--debug`, then the configured
//! level. Output is either human-readable or JSON per the `[logging]` table.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Args, LoggingSettings};

/// Initializes the global tracing subscriber.
///
/// May only be called once per process; tests that need logging should rely
/// on `RUST_LOG` and the binary's single call here.
pub fn setup_logging(args: &Args, settings: Option<&LoggingSettings>) -> Result<()> {
    let level = if args.debug {
        "debug"
    } else {
        settings.map(|s| s.level.as_str()).unwrap_or("info")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json_format = settings.map(|s| s.json_format).unwrap_or(false);
    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    Ok(())
}
