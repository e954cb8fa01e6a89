pub mod config;
pub mod error;

pub use config::{
    Config, IdentityConfig, StorageConfig, UnitPreference, ValidationResult, WeatherConfig,
};
pub use error::{AppError, AuthError, ConfigError, ValidationError};

use anyhow::Result;

/// Initialize the core application (tracing/logging).
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    tracing::info!("SkyView core initialized");
    Ok(())
}
