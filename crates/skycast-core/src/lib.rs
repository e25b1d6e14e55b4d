pub mod config;
pub mod error;

pub use config::{Config, ValidationResult};
pub use error::{ErrorKind, WeatherError};

use anyhow::Result;

/// Initialize the core: logging with env-filter support.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Skycast core initialized");
    Ok(())
}
