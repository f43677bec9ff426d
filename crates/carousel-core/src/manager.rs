//! Named pool management
//!
//! Maps service names to their address pools. The map has its own lock,
//! separate from each pool's internal lock; lock acquisition order is
//! always map first, pool second, and the map lock is released before the
//! pool is touched. Contention on one service therefore never blocks
//! selections for another.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::pool::AddressPool;

/// Keeps one [`AddressPool`] per service name.
///
/// Construct one manager per process and hand out `Arc` clones to every
/// component that selects addresses. Pools are created lazily on the first
/// address update for a name and live for the manager's lifetime; a service
/// whose instance list becomes empty keeps an empty pool rather than being
/// removed.
pub struct PoolManager {
    pools: RwLock<HashMap<String, Arc<AddressPool>>>,
}

impl PoolManager {
    /// Create a manager with no pools.
    pub fn new() -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the address list for a service, creating its pool on first
    /// use.
    ///
    /// Only the find-or-create step holds the map lock; the list swap runs
    /// under the pool's own lock afterwards.
    pub fn set_addresses(&self, service: &str, addresses: Vec<String>) {
        let pool = self.find_or_create(service);
        pool.set_addresses(addresses);
    }

    /// Select the next address in rotation for a service.
    ///
    /// Returns the empty string when the service was never registered or
    /// currently has no addresses; callers cannot distinguish the two and
    /// must treat both as "service unavailable". A lookup of an unknown name
    /// does not create a pool.
    pub fn next_address(&self, service: &str) -> String {
        let pool = { self.pools.read().get(service).cloned() };

        match pool {
            Some(pool) => pool.next_address(),
            None => String::new(),
        }
    }

    /// Number of services with a pool.
    pub fn service_count(&self) -> usize {
        self.pools.read().len()
    }

    /// Names of all services with a pool.
    pub fn service_names(&self) -> Vec<String> {
        self.pools.read().keys().cloned().collect()
    }

    /// Number of addresses currently pooled for a service.
    pub fn address_count(&self, service: &str) -> usize {
        let pool = { self.pools.read().get(service).cloned() };
        pool.map(|p| p.address_count()).unwrap_or(0)
    }

    fn find_or_create(&self, service: &str) -> Arc<AddressPool> {
        // Fast path: the pool already exists.
        if let Some(pool) = self.pools.read().get(service) {
            return pool.clone();
        }

        let mut pools = self.pools.write();
        pools
            .entry(service.to_string())
            .or_insert_with(|| {
                debug!("Created address pool for service: {}", service);
                Arc::new(AddressPool::new())
            })
            .clone()
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new()
    }
}
