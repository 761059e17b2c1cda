//! Cache Entry Module
//!
//! Defines the bookkeeping record kept for every resident key.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Per-key metadata tracked by the eviction engine.
///
/// The value bytes are owned by the storage backend; the entry only carries the
/// key and the time it was last touched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cache key
    pub key: Vec<u8>,
    /// Set on insertion, refreshed on every hit or re-insertion
    pub touched_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry touched at `now`.
    pub fn new(key: Vec<u8>, now: Instant) -> Self {
        Self {
            key,
            touched_at: now,
        }
    }

    // == Touch ==
    /// Refreshes the last-touch timestamp.
    pub fn touch(&mut self, now: Instant) {
        self.touched_at = now;
    }

    // == Is Expired ==
    /// Checks whether more than `ttl` has elapsed since the last touch.
    ///
    /// An entry touched exactly `ttl` ago is still live.
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.touched_at) > ttl
    }
}
