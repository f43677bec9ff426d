//! Round-robin address pool for a single logical service
//!
//! The pool holds the ordered list of endpoints currently known for one
//! service and a rotation cursor that advances by one position per
//! selection. The list is replaced wholesale whenever fresher instance
//! data arrives; the cursor deliberately survives replacements.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

/// Round-robin pool of addresses for one service.
///
/// `set_addresses` and `next_address` are mutually exclusive via the pool's
/// own lock, so a reader always computes its index against the length of the
/// list it is about to index into, never against a stale length after a
/// concurrent shrink.
pub struct AddressPool {
    /// Current endpoints, in registry order.
    addresses: Mutex<Vec<String>>,
    /// Rotation cursor. Monotonically increasing for the lifetime of the
    /// pool; only ever read modulo the current list length. Incremented
    /// inside the `addresses` critical section.
    cursor: AtomicU64,
}

impl AddressPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            addresses: Mutex::new(Vec::new()),
            cursor: AtomicU64::new(0),
        }
    }

    /// Replace the pool's address list.
    ///
    /// The replacement is atomic with respect to concurrent
    /// [`next_address`](Self::next_address) calls. The rotation cursor is
    /// not reset: after the list shrinks, the next selection is not
    /// guaranteed to visit every remaining address before repeating.
    /// Round-robin fairness is only approximate across updates.
    pub fn set_addresses(&self, addresses: Vec<String>) {
        let mut guard = self.addresses.lock();
        debug!(
            "Address pool updated: {} -> {} addresses",
            guard.len(),
            addresses.len()
        );
        *guard = addresses;
    }

    /// Select the next address in rotation.
    ///
    /// Returns the empty string when the pool holds no addresses. The empty
    /// string means "service currently unavailable" and must be checked for
    /// before dialing; it is never a valid address.
    pub fn next_address(&self) -> String {
        let addresses = self.addresses.lock();

        if addresses.is_empty() {
            return String::new();
        }

        // Post-increment: the cursor value *after* the bump picks the slot,
        // so a fresh pool starts one past the first entry. Wrap-around is
        // modulo arithmetic on u64 overflow and on list length alike.
        let next = self.cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        addresses[(next % addresses.len() as u64) as usize].clone()
    }

    /// Number of addresses currently in the pool.
    pub fn address_count(&self) -> usize {
        self.addresses.lock().len()
    }

    /// Snapshot of the current address list.
    pub fn addresses(&self) -> Vec<String> {
        self.addresses.lock().clone()
    }
}

impl Default for AddressPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn pool_with(addresses: &[&str]) -> AddressPool {
        let pool = AddressPool::new();
        pool.set_addresses(addresses.iter().map(|a| a.to_string()).collect());
        pool
    }

    #[test]
    fn test_empty_pool_returns_sentinel() {
        let pool = AddressPool::new();
        assert_eq!(pool.next_address(), "");
    }

    #[test]
    fn test_cleared_pool_returns_sentinel() {
        let pool = pool_with(&["10.0.0.1:8080"]);
        assert_eq!(pool.next_address(), "10.0.0.1:8080");

        pool.set_addresses(vec![]);
        assert_eq!(pool.next_address(), "");
    }

    #[test]
    fn test_two_address_alternation() {
        let pool = pool_with(&["10.0.0.1:8080", "10.0.0.2:8080"]);

        // Fresh pool starts one past the first entry, then strictly
        // alternates with cycle length 2.
        assert_eq!(pool.next_address(), "10.0.0.2:8080");
        assert_eq!(pool.next_address(), "10.0.0.1:8080");
        assert_eq!(pool.next_address(), "10.0.0.2:8080");
    }

    #[test]
    fn test_full_rotation_visits_each_once() {
        let addresses = ["a", "b", "c", "d", "e"];
        let pool = pool_with(&addresses);

        let first = pool.next_address();
        let start = addresses.iter().position(|a| *a == first).unwrap();

        // The remaining n-1 picks continue in list order from the first
        // result, wrapping back to index 0 after the end.
        for i in 1..addresses.len() {
            let expected = addresses[(start + i) % addresses.len()];
            assert_eq!(pool.next_address(), expected);
        }

        // Next full cycle begins where the previous one left off.
        assert_eq!(pool.next_address(), first);
    }

    #[test]
    fn test_selection_does_not_mutate_list() {
        let pool = pool_with(&["a", "b", "c"]);

        for _ in 0..10 {
            pool.next_address();
        }

        assert_eq!(pool.addresses(), vec!["a", "b", "c"]);
        assert_eq!(pool.address_count(), 3);
    }

    #[test]
    fn test_replacement_yields_only_new_addresses() {
        let pool = pool_with(&["old-1", "old-2"]);
        pool.next_address();

        pool.set_addresses(vec!["new-1".to_string(), "new-2".to_string()]);

        for _ in 0..4 {
            let picked = pool.next_address();
            assert!(picked == "new-1" || picked == "new-2");
        }
    }

    #[test]
    fn test_cursor_survives_replacement() {
        let pool = pool_with(&["a", "b", "c"]);

        // Advance the cursor to 2.
        pool.next_address();
        pool.next_address();

        // After the swap the cursor keeps counting: 3 % 2 == 1.
        pool.set_addresses(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(pool.next_address(), "y");
        assert_eq!(pool.next_address(), "x");
    }

    #[test]
    fn test_shrink_below_cursor_does_not_panic() {
        let pool = pool_with(&["a", "b", "c", "d", "e"]);
        for _ in 0..4 {
            pool.next_address();
        }

        pool.set_addresses(vec!["only".to_string()]);
        assert_eq!(pool.next_address(), "only");
        assert_eq!(pool.next_address(), "only");
    }

    #[test]
    fn test_concurrent_selection_distributes_evenly() {
        let pool = Arc::new(pool_with(&["a", "b", "c"]));

        // Every call takes a distinct cursor value, so 300 calls over 3
        // addresses must land exactly 100 times on each.
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                thread::spawn(move || {
                    let mut picked = Vec::with_capacity(75);
                    for _ in 0..75 {
                        picked.push(pool.next_address());
                    }
                    picked
                })
            })
            .collect();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for handle in handles {
            for address in handle.join().unwrap() {
                *counts.entry(address).or_default() += 1;
            }
        }

        assert_eq!(counts.len(), 3);
        for address in ["a", "b", "c"] {
            assert_eq!(counts[address], 100);
        }
    }

    #[test]
    fn test_concurrent_replacement_never_yields_mixed_state() {
        let pool = Arc::new(pool_with(&["old-1", "old-2"]));

        let writer = {
            let pool = pool.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    if i % 2 == 0 {
                        pool.set_addresses(vec!["new-1".to_string(), "new-2".to_string()]);
                    } else {
                        pool.set_addresses(vec!["old-1".to_string(), "old-2".to_string()]);
                    }
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let picked = pool.next_address();
                        // A reader sees the old list or the new list, never
                        // a mix and never an out-of-bounds panic.
                        assert!(
                            picked == "old-1"
                                || picked == "old-2"
                                || picked == "new-1"
                                || picked == "new-2"
                        );
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
