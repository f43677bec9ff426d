//! Configuration loading and management

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DiscoveryError;

/// Discovery configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// Services to watch, optionally with static seed addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceConfig>,
}

/// Watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Seconds between background refresh sweeps.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

/// One watched service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Logical service name as known to the registry.
    pub name: String,
    /// Static seed addresses, used to pre-populate pools before the first
    /// registry refresh (or instead of one, with a static source).
    #[serde(default)]
    pub addresses: Vec<String>,
}

fn default_refresh_interval_secs() -> u64 {
    30
}

impl DiscoveryConfig {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: DiscoveryConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Reject configurations that cannot drive a watcher.
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.watcher.refresh_interval_secs == 0 {
            return Err(DiscoveryError::Configuration(
                "refresh_interval_secs must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if service.name.is_empty() {
                return Err(DiscoveryError::Configuration(
                    "service name must not be empty".to_string(),
                ));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(DiscoveryError::Configuration(format!(
                    "duplicate service name: {}",
                    service.name
                )));
            }
        }

        Ok(())
    }

    /// Names of all configured services, in configuration order.
    pub fn service_names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name.clone()).collect()
    }
}
