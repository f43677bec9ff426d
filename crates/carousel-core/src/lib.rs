//! Carousel Core Balancing Logic
//!
//! This crate provides the core functionality for Carousel: round-robin
//! address pools for client-side load balancing across dynamically
//! discovered service instances.
//!
//! Instance lists arrive from the outside (typically a registry watcher)
//! through [`PoolManager::set_addresses`]; request-handling code obtains a
//! target for an outbound call through [`PoolManager::next_address`].
//! Absence of addresses is signaled with the empty-string sentinel rather
//! than an error; callers must check for it before dialing.

pub mod manager;
pub mod pool;

pub use manager::PoolManager;
pub use pool::AddressPool;
