//! # Configuration Management
//!
//! Layered configuration for the DYHE back-office service: built-in defaults,
//! an optional YAML/TOML file, then `DYHE__SECTION__KEY` environment variables.

pub mod settings;

pub use settings::{
    AppConfig, AuthConfig, BootstrapConfig, DatabaseConfig, ObservabilityConfig, ServerConfig,
    WebConfig,
};

use crate::errors::Result;
use config::{Config, Environment, File};
use std::path::Path;

/// Prefix for environment overrides, e.g. `DYHE__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "DYHE";

/// Load and validate the application configuration.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?);

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("web.protected_prefixes")
            .with_list_parse_key("server.cors_origins")
            .try_parsing(true),
    );

    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate()?;

    tracing::debug!(
        server = %config.server.bind_address(),
        database_in_memory = config.database.is_in_memory(),
        "configuration loaded"
    );

    Ok(config)
}
