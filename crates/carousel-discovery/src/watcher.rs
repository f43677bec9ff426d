//! Registry watcher
//!
//! Pulls instance lists through a [`RegistrySource`] and pushes the
//! addresses of instances reported up into a [`PoolManager`]. Refreshes
//! run once on demand ([`RegistryWatcher::refresh_service`],
//! [`RegistryWatcher::resolve`]) or periodically via
//! [`spawn_refresh_task`]. Data flows one way: registry to pools, never
//! back.

use std::collections::HashMap;
use std::sync::Arc;

use carousel_core::PoolManager;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::DiscoveryError;
use crate::source::RegistrySource;

/// Outcome of the most recent refresh of one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshStatus {
    pub service: String,
    pub last_refresh: DateTime<Utc>,
    /// Instances pushed into the pool by the last successful refresh.
    pub instances: usize,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

/// Keeps a set of watched services in sync with a registry source.
pub struct RegistryWatcher {
    source: Arc<dyn RegistrySource>,
    pools: Arc<PoolManager>,
    /// Service names refreshed by `refresh_all`.
    services: RwLock<Vec<String>>,
    /// Per-service refresh bookkeeping.
    status: RwLock<HashMap<String, RefreshStatus>>,
}

impl RegistryWatcher {
    /// Create a watcher over the given source and pools.
    ///
    /// `services` is the initial watched set; more can be added later with
    /// [`watch`](Self::watch), and [`resolve`](Self::resolve) adds its
    /// service implicitly.
    pub fn new(
        source: Arc<dyn RegistrySource>,
        pools: Arc<PoolManager>,
        services: Vec<String>,
    ) -> Self {
        info!("Created registry watcher for {} services", services.len());

        Self {
            source,
            pools,
            services: RwLock::new(services),
            status: RwLock::new(HashMap::new()),
        }
    }

    /// Add a service to the watched set. Idempotent.
    pub fn watch(&self, service: &str) {
        let mut services = self.services.write();
        if !services.iter().any(|s| s == service) {
            debug!("Watching service: {}", service);
            services.push(service.to_string());
        }
    }

    /// Names currently refreshed by [`refresh_all`](Self::refresh_all).
    pub fn watched_services(&self) -> Vec<String> {
        self.services.read().clone()
    }

    /// Refresh one service from the registry.
    ///
    /// Pushes the addresses of instances reported up into the pool, in
    /// registry order, and returns how many were pushed. On a source error
    /// the pool keeps its previous addresses.
    pub async fn refresh_service(&self, service: &str) -> Result<usize, DiscoveryError> {
        match self.source.fetch_instances(service).await {
            Ok(instances) => {
                let addresses: Vec<String> = instances
                    .iter()
                    .filter(|i| i.is_up())
                    .map(|i| i.address.clone())
                    .collect();
                let pushed = addresses.len();

                debug!(
                    "Refreshed service {}: {} of {} instances up",
                    service,
                    pushed,
                    instances.len()
                );

                self.pools.set_addresses(service, addresses);
                self.record_success(service, pushed);
                Ok(pushed)
            }
            Err(e) => {
                self.record_failure(service, &e);
                Err(e)
            }
        }
    }

    /// Refresh every watched service, one after another.
    ///
    /// A failing service is logged and skipped rather than aborting the
    /// sweep.
    pub async fn refresh_all(&self) -> Vec<RefreshStatus> {
        let services = self.watched_services();

        for service in &services {
            if let Err(e) = self.refresh_service(service).await {
                warn!("Failed to refresh service {}: {}", service, e);
            }
        }

        self.refresh_status()
    }

    /// Refresh a service, then pick the next address for it.
    ///
    /// The refresh-then-pick path for callers that want registry-fresh
    /// selection on every lookup. The service joins the watched set, so
    /// subsequent background sweeps keep it current. Returns the empty
    /// string when no instance is up, the same sentinel as
    /// [`PoolManager::next_address`].
    pub async fn resolve(&self, service: &str) -> Result<String, DiscoveryError> {
        self.watch(service);
        self.refresh_service(service).await?;
        Ok(self.pools.next_address(service))
    }

    /// Refresh bookkeeping for every service refreshed so far.
    pub fn refresh_status(&self) -> Vec<RefreshStatus> {
        self.status.read().values().cloned().collect()
    }

    /// Refresh bookkeeping for one service.
    pub fn refresh_status_for(&self, service: &str) -> Option<RefreshStatus> {
        self.status.read().get(service).cloned()
    }

    fn record_success(&self, service: &str, instances: usize) {
        let mut status = self.status.write();
        status.insert(
            service.to_string(),
            RefreshStatus {
                service: service.to_string(),
                last_refresh: Utc::now(),
                instances,
                last_error: None,
                consecutive_failures: 0,
            },
        );
    }

    fn record_failure(&self, service: &str, error: &DiscoveryError) {
        let mut status = self.status.write();
        let entry = status
            .entry(service.to_string())
            .or_insert_with(|| RefreshStatus {
                service: service.to_string(),
                last_refresh: Utc::now(),
                instances: 0,
                last_error: None,
                consecutive_failures: 0,
            });

        entry.last_refresh = Utc::now();
        entry.last_error = Some(error.to_string());
        entry.consecutive_failures += 1;
    }
}

/// Spawn a background task refreshing all watched services on a fixed
/// interval.
pub fn spawn_refresh_task(
    watcher: Arc<RegistryWatcher>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    use tokio::time::{Duration, interval};

    info!(
        "Starting background registry refresh task (interval: {} seconds)",
        interval_secs
    );

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_secs));

        // Skip the first tick (which fires immediately)
        ticker.tick().await;

        loop {
            ticker.tick().await;
            debug!("Running scheduled registry refresh");

            let statuses = watcher.refresh_all().await;
            let failed = statuses
                .iter()
                .filter(|s| s.last_error.is_some())
                .count();
            if failed > 0 {
                warn!(
                    "Registry refresh sweep: {} of {} services failing",
                    failed,
                    statuses.len()
                );
            }
        }
    })
}
