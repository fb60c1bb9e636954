//! Configuration loading with environment awareness.
//!
//! Sources, in increasing precedence: built-in defaults, an optional YAML
//! file (`FLEET_CONFIG` path, default `config/fleet-core.yaml`), then
//! `FLEET_*` environment variables (`FLEET_DATABASE__HOST`, etc.).

use crate::config::FleetConfig;
use crate::error::{Result, ServiceError};

/// Loads and holds the effective [`FleetConfig`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: FleetConfig,
    environment: String,
}

impl ConfigManager {
    /// Load configuration for the current environment.
    pub fn load() -> Result<Self> {
        let environment =
            std::env::var("FLEET_ENV").unwrap_or_else(|_| "development".to_string());
        let config_path = std::env::var("FLEET_CONFIG")
            .unwrap_or_else(|_| "config/fleet-core.yaml".to_string());
        Self::load_from_path(&config_path, &environment)
    }

    /// Load configuration from an explicit file path. The file may be absent;
    /// defaults and environment overrides still apply.
    pub fn load_from_path(path: &str, environment: &str) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("FLEET")
                    .separator("__")
                    .ignore_empty(true),
            );

        let raw = builder
            .build()
            .map_err(|e| ServiceError::Configuration(format!("failed to read config: {e}")))?;

        let config: FleetConfig = raw
            .try_deserialize()
            .map_err(|e| ServiceError::Configuration(format!("invalid config: {e}")))?;

        Ok(Self {
            config,
            environment: environment.to_string(),
        })
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }
}
