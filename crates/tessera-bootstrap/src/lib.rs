//! Tessera Bootstrap - Settings, tracing and service wiring

pub mod config;
pub mod services;
pub mod telemetry;


use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use tessera_core::ResourceBackend;

pub use config::{LoggingSettings, SchemaSettings, Settings, ENV_PREFIX};
pub use services::Services;
pub use telemetry::init_tracing;

/// Load `.env` and settings, install tracing, and connect services
pub async fn start(backend: Arc<dyn ResourceBackend>) -> Result<(Settings, Services)> {
    dotenvy::dotenv().ok();

    let settings = Settings::load().context("Failed to load configuration")?;
    init_tracing(&settings.logging)?;
    info!("Starting Tessera v{}", env!("CARGO_PKG_VERSION"));

    let services = Services::connect(&settings, backend).await?;
    Ok((settings, services))
}
