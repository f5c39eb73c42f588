//! Layered settings
//!
//! Sources, later ones winning: built-in defaults, `config/default.*`,
//! `config/local.*`, then `TESSERA_<SECTION>__<KEY>` environment variables.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use tessera_provision::ProvisionerConfig;
use tessera_rebac::ResolverConfig;
use tessera_spicedb::SpiceDbConfig;

pub const ENV_PREFIX: &str = "TESSERA";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub spicedb: SpiceDbConfig,
    pub schema: SchemaSettings,
    pub resolver: ResolverConfig,
    pub provisioning: ProvisionerConfig,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Write the SpiceDB schema when services start
    pub write_on_start: bool,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            write_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info,tessera=debug".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load from `./config` and the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config"), None)
    }

    /// Load from `config_dir`. `env` replaces the process environment when given.
    pub fn load_from(config_dir: &Path, env: Option<config::Map<String, String>>) -> Result<Self> {
        let file = |name: &str| {
            config::File::with_name(&config_dir.join(name).to_string_lossy()).required(false)
        };

        let config = config::Config::builder()
            .add_source(file("default"))
            .add_source(file("local"))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("resolver.connector_prefixes")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
