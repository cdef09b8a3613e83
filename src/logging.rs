//! Logging setup for the CLI.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{CoolerError, Result};

/// Install a `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn setup_logging(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| CoolerError::Config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| CoolerError::Config(format!("Logging already initialized: {}", e)))?;

    Ok(())
}
