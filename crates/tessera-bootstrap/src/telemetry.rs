//! Tracing subscriber setup

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// `RUST_LOG` wins over the configured filter
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.filter)
            .with_context(|| format!("Invalid log filter '{}'", settings.filter)),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(settings: &LoggingSettings) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(settings)?);

    let installed = if settings.json {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    installed.context("Failed to install tracing subscriber")
}
