//! # Configuration
//!
//! Typed configuration for the batching dispatcher and the surrounding people
//! service. Values are layered by [`loader`]: built-in defaults, then an
//! optional YAML/TOML file, then `PEOPLE_RW__*` environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use people_rw_core::config::ServiceConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::load(None)?;
//! let max_wait = config.batcher.max_wait();
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigurationError;

pub use loader::ENV_PREFIX;

/// Batching thresholds for a [`BatchDispatcher`](crate::batching::BatchDispatcher)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatcherConfig {
    /// Flush as soon as this many operations are pending
    pub max_batch_size: usize,

    /// Flush this long after the pending batch became non-empty
    pub max_wait_ms: u64,

    /// Bounded mailbox capacity between submitters and the collector
    pub mailbox_capacity: usize,
}

impl BatcherConfig {
    pub fn new(max_batch_size: usize, max_wait: Duration) -> Self {
        Self {
            max_batch_size,
            max_wait_ms: max_wait.as_millis().try_into().unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    /// Reject thresholds the collector cannot operate with
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_batch_size",
                self.max_batch_size,
                "must be greater than 0",
            ));
        }

        if self.max_wait_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_wait_ms",
                self.max_wait_ms,
                "must be greater than 0",
            ));
        }

        if self.mailbox_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "mailbox_capacity",
                self.mailbox_capacity,
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1024,
            max_wait_ms: 20,
            mailbox_capacity: 1024,
        }
    }
}

/// Settings for the people read/write service as a whole
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Graph database endpoint
    pub neo_url: String,

    /// Port the HTTP layer listens on
    pub port: u16,

    pub batcher: BatcherConfig,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.neo_url.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "neo_url",
                &self.neo_url,
                "must not be empty",
            ));
        }

        if self.port == 0 {
            return Err(ConfigurationError::invalid_value(
                "port",
                self.port,
                "must be greater than 0",
            ));
        }

        self.batcher.validate()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            neo_url: "http://localhost:7474/db/data".to_string(),
            port: 8080,
            batcher: BatcherConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_batcher_config_is_valid() {
        let config = BatcherConfig::default();
        assert_eq!(config.max_batch_size, 1024);
        assert_eq!(config.max_wait(), Duration::from_millis(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = BatcherConfig::new(0, Duration::from_millis(20));
        let error = config.validate().unwrap_err();
        assert!(matches!(
            error,
            ConfigurationError::InvalidValue { ref field, .. } if field == "max_batch_size"
        ));
    }

    #[test]
    fn test_zero_wait_rejected() {
        let config = BatcherConfig::new(3, Duration::ZERO);
        let error = config.validate().unwrap_err();
        assert!(matches!(
            error,
            ConfigurationError::InvalidValue { ref field, .. } if field == "max_wait_ms"
        ));
    }

    #[test]
    fn test_sub_millisecond_wait_rejected() {
        // Durations are tracked at millisecond resolution
        let config = BatcherConfig::new(3, Duration::from_micros(500));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_service_config_rejects_empty_url() {
        let config = ServiceConfig {
            neo_url: "  ".to_string(),
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
