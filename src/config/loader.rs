//! Configuration Loader
//!
//! Layers built-in defaults, an optional configuration file and environment
//! variables into a validated [`ServiceConfig`].

use config::{Config, Environment, File};
use std::env;
use std::path::Path;
use tracing::debug;

use super::ServiceConfig;
use crate::error::ConfigurationError;

/// Prefix for environment overrides, e.g. `PEOPLE_RW__BATCHER__MAX_WAIT_MS=50`
pub const ENV_PREFIX: &str = "PEOPLE_RW";

impl ServiceConfig {
    /// Load configuration from defaults, `file` (if given) and the environment
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigurationError> {
        let defaults = Config::try_from(&ServiceConfig::default())?;

        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = file {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path));
        }

        let config: ServiceConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        debug!(
            environment = %detect_environment(),
            neo_url = %config.neo_url,
            port = config.port,
            max_batch_size = config.batcher.max_batch_size,
            max_wait_ms = config.batcher.max_wait_ms,
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}

/// Current deployment environment, lowercased
pub fn detect_environment() -> String {
    env::var("PEOPLE_RW_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
        .to_lowercase()
}
