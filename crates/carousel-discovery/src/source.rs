//! Registry source trait
//!
//! The seam between Carousel and whatever tracks live service instances.
//! A discovery client (Consul, etcd, DNS, a sidecar API) implements
//! [`RegistrySource`]; the watcher only ever asks it one question: what are
//! the current instances of service X?

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;

/// Instance status as reported by the registry.
///
/// Only [`Up`](InstanceStatus::Up) instances are eligible for selection;
/// anything else is excluded when pools are refreshed. This is passive
/// interpretation of registry data; Carousel never probes instances
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstanceStatus {
    Up,
    Down,
    #[default]
    Unknown,
}

/// One service instance known to the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Network location of the instance (host:port or URL).
    pub address: String,
    /// Registry-reported status. Absent in the registry payload means
    /// unknown, which is treated as not selectable.
    #[serde(default)]
    pub status: InstanceStatus,
}

impl ServiceInstance {
    /// Create an instance reported up.
    pub fn up(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status: InstanceStatus::Up,
        }
    }

    /// Create an instance reported down.
    pub fn down(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status: InstanceStatus::Down,
        }
    }

    /// Whether the registry reports this instance as up.
    pub fn is_up(&self) -> bool {
        self.status == InstanceStatus::Up
    }
}

/// Source of service instance lists.
///
/// Implementations are expected to return the registry's current view on
/// every call; caching and refresh cadence are the watcher's concern, not
/// the source's.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Fetch the current instances of a service.
    ///
    /// An unknown service is an empty list, not an error; errors are for
    /// failures to reach or parse the registry.
    async fn fetch_instances(
        &self,
        service: &str,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError>;
}

/// In-memory registry source.
///
/// Serves fixed fleets and tests: instances are whatever was inserted,
/// nothing expires. Can be seeded from the static addresses in a
/// [`DiscoveryConfig`].
pub struct StaticSource {
    instances: RwLock<HashMap<String, Vec<ServiceInstance>>>,
}

impl StaticSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a source from configured static addresses, all reported up.
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        let source = Self::new();
        {
            let mut instances = source.instances.write();
            for service in &config.services {
                instances.insert(
                    service.name.clone(),
                    service.addresses.iter().map(ServiceInstance::up).collect(),
                );
            }
        }
        source
    }

    /// Replace the instances of a service.
    pub fn set_instances(&self, service: &str, instances: Vec<ServiceInstance>) {
        self.instances.write().insert(service.to_string(), instances);
    }
}

impl Default for StaticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrySource for StaticSource {
    async fn fetch_instances(
        &self,
        service: &str,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        Ok(self
            .instances
            .read()
            .get(service)
            .cloned()
            .unwrap_or_default())
    }
}
