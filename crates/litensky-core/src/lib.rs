pub mod config;
pub mod error;
pub mod store;

pub use config::{
    Config, FixedPosition, ImagesConfig, LocationConfig, StorageConfig, ValidationResult,
    WeatherConfig,
};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt, StoreError};
pub use store::{keys, KeyValueStore, MemoryStore, SqliteStore, Storage, StoreResult};

use anyhow::Result;

/// Initialize logging for the process
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("LitenSky core initialized");
    Ok(())
}
