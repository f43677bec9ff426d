//! Carousel Service Discovery Layer
//!
//! This crate feeds [`carousel_core`] address pools from a service
//! registry. The registry protocol itself stays external: discovery clients
//! implement the [`RegistrySource`] trait, and the [`RegistryWatcher`]
//! pulls instance lists through it, once on demand or periodically via a
//! background task, pushing the addresses of instances reported up into a
//! [`carousel_core::PoolManager`].

pub mod config;
pub mod error;
pub mod source;
pub mod watcher;

pub use config::{DiscoveryConfig, ServiceConfig, WatcherConfig};
pub use error::DiscoveryError;
pub use source::{InstanceStatus, RegistrySource, ServiceInstance, StaticSource};
pub use watcher::{RefreshStatus, RegistryWatcher, spawn_refresh_task};
