#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod error;

pub use config::{
    Config, FavoritesConfig, GeolocationConfig, GeolocationMode, Position, ValidationResult,
    WeatherConfig,
};
pub use error::{AppError, ConfigError, FavoritesError, NetworkError, ReqwestErrorExt, WeatherError};

use anyhow::Result;

/// Initialize tracing for the application.
///
/// Honors `RUST_LOG`; defaults to `info`. Safe to call more than once.
pub fn init() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    tracing::info!("Tripcast core initialized");
    Ok(())
}
