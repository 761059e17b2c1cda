//! Cache Statistics Module
//!
//! Counters for lookups, capacity evictions and lazily discovered expirations.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of eviction engine counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups for absent or expired keys
    pub misses: u64,
    /// Entries dropped by capacity pressure
    pub evictions: u64,
    /// Entries dropped because their TTL had elapsed when looked up
    pub expirations: u64,
    /// Resident entries at snapshot time
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// An expiry is also a miss from the caller's point of view.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
        self.misses += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
