//! Cache Store Module
//!
//! The eviction engine: recency ordering and TTL policy in memory, value bytes in
//! a pluggable storage backend.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheStats, LruTracker};
use crate::error::{CacheError, Result};
use crate::storage::StorageBackend;

struct Inner {
    order: LruTracker,
    backend: Box<dyn StorageBackend>,
    stats: CacheStats,
}

// == LRU Cache ==
/// Capacity- and TTL-bounded LRU cache over a storage backend.
///
/// Every operation runs under one lock covering both the recency order and the
/// backend call, so the set of tracked keys always matches the set of keys held
/// by the backend.
pub struct LruCache {
    inner: Mutex<Inner>,
    max_entries: usize,
    ttl: Duration,
}

impl LruCache {
    // == Constructor ==
    /// Creates an empty cache over `backend`.
    ///
    /// # Errors
    /// `CacheError::Config` if `max_entries` or `ttl` is zero.
    pub fn new<B>(backend: B, max_entries: usize, ttl: Duration) -> Result<Self>
    where
        B: StorageBackend + 'static,
    {
        Self::with_backend(Box::new(backend), max_entries, ttl)
    }

    /// Same as [`LruCache::new`] for an already boxed backend.
    pub fn with_backend(
        backend: Box<dyn StorageBackend>,
        max_entries: usize,
        ttl: Duration,
    ) -> Result<Self> {
        if max_entries == 0 {
            return Err(CacheError::Config(
                "max cached entries must be positive".to_string(),
            ));
        }
        if ttl.is_zero() {
            return Err(CacheError::Config("ttl must be positive".to_string()));
        }

        debug!(
            "LRU cache over {} backend: max_entries={}, ttl={:?}",
            backend.kind(),
            max_entries,
            ttl
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                order: LruTracker::new(),
                backend,
                stats: CacheStats::new(),
            }),
            max_entries,
            ttl,
        })
    }

    // == Get ==
    /// Looks up `key`.
    ///
    /// Returns `Ok(None)` if the key is absent or its TTL has elapsed; an expired
    /// entry is dropped from the backend and the recency order. A hit refreshes
    /// the entry and moves it to the head.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = Instant::now();

        let expired = match inner.order.get(key) {
            Some(entry) => entry.is_expired(self.ttl, now),
            None => {
                inner.stats.record_miss();
                return Ok(None);
            }
        };

        if expired {
            // On failure the entry stays tracked: the value is still in the backend.
            inner.backend.delete(key)?;
            inner.order.remove(key);
            inner.stats.record_expiration();
            debug!("Expired key {}", String::from_utf8_lossy(key));
            return Ok(None);
        }

        match inner.backend.get(key)? {
            Some(value) => {
                inner.order.touch(key, now);
                inner.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                warn!(
                    "Key {} tracked but missing from {} backend, dropping it",
                    String::from_utf8_lossy(key),
                    inner.backend.kind()
                );
                inner.order.remove(key);
                inner.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Add ==
    /// Stores `value` under `key` and makes it the most recently used entry.
    ///
    /// Re-adding a resident key replaces its value in place. Adding a new key
    /// beyond capacity evicts the least recently used entry, expired or not.
    ///
    /// # Errors
    /// `CacheError::Storage` if the backend write fails, in which case the
    /// recency order is left untouched, or if deleting the evicted value fails.
    /// In the latter case the new value is resident, the victim stays at the
    /// tail, and the next `add` of any key evicts down to capacity again.
    pub fn add(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        inner.backend.put(key, value)?;
        inner.order.touch(key, Instant::now());
        // Also catches overflow left behind by an earlier failed eviction.
        self.evict_overflow(inner)
    }

    fn evict_overflow(&self, inner: &mut Inner) -> Result<()> {
        while inner.order.len() > self.max_entries {
            let Some(victim) = inner.order.evict_oldest() else {
                break;
            };
            if let Err(err) = inner.backend.delete(&victim.key) {
                inner.order.restore_oldest(victim);
                return Err(err.into());
            }
            inner.stats.record_eviction();
            debug!("Evicted key {}", String::from_utf8_lossy(&victim.key));
        }
        Ok(())
    }

    // == Close ==
    /// Flushes and closes the backend. Called once at shutdown.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.backend.close()?;
        Ok(())
    }

    // == Stats ==
    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.order.len());
        stats
    }

    /// Resident keys from most to least recently used.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.inner.lock().order.keys()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.inner.lock().order.contains(key)
    }

    // == Length ==
    /// Returns the current number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for LruCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("max_entries", &self.max_entries)
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::SharedBackend;
    use crate::storage::{DurableBackend, MemoryBackend};
    use std::collections::HashSet;
    use std::thread::sleep;

    const HOUR: Duration = Duration::from_secs(3600);

    fn value_of(cache: &LruCache, key: &[u8]) -> Option<Vec<u8>> {
        cache.get(key).unwrap()
    }

    /// Eviction walk-through shared by both backends.
    fn run_eviction_scenario(cache: &LruCache) {
        cache.add(b"testKey1", b"testVal1").unwrap();
        cache.add(b"testKey2", b"testVal2").unwrap();
        cache.add(b"testKey3", b"testVal3").unwrap(); // testKey1 is evicted

        assert_eq!(value_of(cache, b"testKey3"), Some(b"testVal3".to_vec()));
        assert_eq!(value_of(cache, b"testKey2"), Some(b"testVal2".to_vec()));
        assert_eq!(value_of(cache, b"testKey1"), None);

        // testKey3 was touched least recently
        cache.add(b"testKey4", b"testVal4").unwrap();
        assert_eq!(value_of(cache, b"testKey3"), None);

        // Duplicate add bumps testKey2 to the head
        cache.add(b"testKey2", b"testVal2").unwrap();
        assert_eq!(cache.len(), 2);
        cache.add(b"testKey5", b"testVal5").unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(value_of(cache, b"testKey4"), None);
        assert_eq!(value_of(cache, b"testKey2"), Some(b"testVal2".to_vec()));
        assert_eq!(value_of(cache, b"testKey5"), Some(b"testVal5".to_vec()));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let result = LruCache::new(MemoryBackend::new(), 0, HOUR);
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_ttl() {
        let result = LruCache::new(MemoryBackend::new(), 10, Duration::ZERO);
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_add_and_get() {
        let cache = LruCache::new(MemoryBackend::new(), 100, HOUR).unwrap();

        cache.add(b"key1", b"value1").unwrap();

        assert_eq!(value_of(&cache, b"key1"), Some(b"value1".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let cache = LruCache::new(MemoryBackend::new(), 100, HOUR).unwrap();
        assert_eq!(value_of(&cache, b"nonexistent"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_overwrite_keeps_occupancy() {
        let cache = LruCache::new(MemoryBackend::new(), 100, HOUR).unwrap();

        cache.add(b"key1", b"value1").unwrap();
        cache.add(b"key1", b"value2").unwrap();

        assert_eq!(value_of(&cache, b"key1"), Some(b"value2".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_scenario_memory_backend() {
        let cache = LruCache::new(MemoryBackend::new(), 2, Duration::from_secs(1)).unwrap();
        run_eviction_scenario(&cache);
        assert_eq!(cache.stats().evictions, 3);
    }

    #[test]
    fn test_eviction_scenario_durable_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DurableBackend::open_fresh(dir.path()).unwrap();
        let cache = LruCache::new(backend, 2, Duration::from_secs(1)).unwrap();

        run_eviction_scenario(&cache);
        cache.close().unwrap();
    }

    #[test]
    fn test_evicted_value_leaves_backend() {
        let backend = SharedBackend::new();
        let cache = LruCache::new(backend.clone(), 2, HOUR).unwrap();

        cache.add(b"k1", b"v1").unwrap();
        cache.add(b"k2", b"v2").unwrap();
        cache.add(b"k3", b"v3").unwrap();

        assert_eq!(backend.value(b"k1"), None);
        let expected = HashSet::from([b"k2".to_vec(), b"k3".to_vec()]);
        assert_eq!(backend.keys(), expected);
    }

    #[test]
    fn test_ttl_expiration() {
        let backend = SharedBackend::new();
        let cache = LruCache::new(backend.clone(), 100, Duration::from_millis(200)).unwrap();

        cache.add(b"key1", b"value1").unwrap();
        assert!(value_of(&cache, b"key1").is_some());

        sleep(Duration::from_millis(350));

        assert_eq!(value_of(&cache, b"key1"), None);
        assert_eq!(cache.len(), 0);
        assert!(backend.keys().is_empty());

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_ttl_expiration_one_second() {
        let cache = LruCache::new(MemoryBackend::new(), 10, Duration::from_secs(1)).unwrap();

        cache.add(b"key1", b"value1").unwrap();
        sleep(Duration::from_millis(1100));

        assert_eq!(value_of(&cache, b"key1"), None);
        assert!(!cache.contains(b"key1"));
    }

    #[test]
    fn test_get_refreshes_ttl() {
        let cache = LruCache::new(MemoryBackend::new(), 10, Duration::from_millis(300)).unwrap();

        cache.add(b"key1", b"value1").unwrap();
        sleep(Duration::from_millis(200));
        assert!(value_of(&cache, b"key1").is_some());
        sleep(Duration::from_millis(200));

        // 400ms since insert but only 200ms since the last touch
        assert!(value_of(&cache, b"key1").is_some());
    }

    #[test]
    fn test_capacity_wins_over_ttl() {
        let cache = LruCache::new(MemoryBackend::new(), 2, Duration::from_millis(100)).unwrap();

        cache.add(b"old", b"v").unwrap();
        sleep(Duration::from_millis(150));
        cache.add(b"fresh1", b"v").unwrap();
        cache.add(b"fresh2", b"v").unwrap();

        // "old" went out by recency, not by expiry discovery
        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.expirations, 0);
        assert_eq!(cache.keys(), vec![b"fresh2".to_vec(), b"fresh1".to_vec()]);
    }

    #[test]
    fn test_get_moves_key_to_head() {
        let cache = LruCache::new(MemoryBackend::new(), 3, HOUR).unwrap();

        cache.add(b"key1", b"value1").unwrap();
        cache.add(b"key2", b"value2").unwrap();
        cache.add(b"key3", b"value3").unwrap();

        cache.get(b"key1").unwrap();
        cache.add(b"key4", b"value4").unwrap();

        assert!(cache.contains(b"key1"));
        assert!(!cache.contains(b"key2"));
    }

    #[test]
    fn test_failed_put_rolls_back() {
        let backend = SharedBackend::new();
        let cache = LruCache::new(backend.clone(), 2, HOUR).unwrap();

        cache.add(b"k1", b"v1").unwrap();
        cache.add(b"k2", b"v2").unwrap();
        let before = cache.keys();

        backend.fail_puts(true);
        let result = cache.add(b"k3", b"v3");

        assert!(matches!(result, Err(CacheError::Storage(_))));
        assert_eq!(cache.keys(), before);
        assert!(!cache.contains(b"k3"));
        assert_eq!(backend.value(b"k1"), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_failed_update_keeps_position_and_value() {
        let backend = SharedBackend::new();
        let cache = LruCache::new(backend.clone(), 2, HOUR).unwrap();

        cache.add(b"k1", b"v1").unwrap();
        cache.add(b"k2", b"v2").unwrap();

        backend.fail_puts(true);
        assert!(cache.add(b"k1", b"changed").is_err());
        backend.fail_puts(false);

        // k1 still least recently used, with its old value
        assert_eq!(cache.keys(), vec![b"k2".to_vec(), b"k1".to_vec()]);
        assert_eq!(backend.value(b"k1"), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_failed_eviction_keeps_victim_tracked() {
        let backend = SharedBackend::new();
        let cache = LruCache::new(backend.clone(), 1, HOUR).unwrap();

        cache.add(b"k1", b"v1").unwrap();
        backend.fail_deletes(true);

        assert!(cache.add(b"k2", b"v2").is_err());
        let tracked: HashSet<Vec<u8>> = cache.keys().into_iter().collect();
        assert_eq!(tracked, backend.keys());
        assert_eq!(cache.keys(), vec![b"k2".to_vec(), b"k1".to_vec()]);

        // Retrying the same key brings occupancy back under the limit
        backend.fail_deletes(false);
        cache.add(b"k2", b"v2").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.keys(), vec![b"k2".to_vec()]);
        assert_eq!(backend.keys(), HashSet::from([b"k2".to_vec()]));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_after_failed_eviction_restores_capacity() {
        let backend = SharedBackend::new();
        let cache = LruCache::new(backend.clone(), 2, HOUR).unwrap();

        cache.add(b"k1", b"v1").unwrap();
        cache.add(b"k2", b"v2").unwrap();
        backend.fail_deletes(true);
        assert!(cache.add(b"k3", b"v3").is_err());
        assert_eq!(cache.len(), 3);
        backend.fail_deletes(false);

        // Updating a resident key is enough to evict the overflow
        cache.add(b"k2", b"v2b").unwrap();
        assert_eq!(cache.keys(), vec![b"k2".to_vec(), b"k3".to_vec()]);
        assert_eq!(backend.value(b"k1"), None);
        assert_eq!(backend.value(b"k2"), Some(b"v2b".to_vec()));
    }

    #[test]
    fn test_failed_read_is_storage_fault() {
        let backend = SharedBackend::new();
        let cache = LruCache::new(backend.clone(), 10, HOUR).unwrap();

        cache.add(b"k1", b"v1").unwrap();
        backend.fail_gets(true);

        assert!(matches!(cache.get(b"k1"), Err(CacheError::Storage(_))));
        assert!(cache.contains(b"k1"));
    }

    #[test]
    fn test_failed_expiry_delete_keeps_entry() {
        let backend = SharedBackend::new();
        let cache = LruCache::new(backend.clone(), 10, Duration::from_millis(50)).unwrap();

        cache.add(b"k1", b"v1").unwrap();
        sleep(Duration::from_millis(100));
        backend.fail_deletes(true);

        assert!(matches!(cache.get(b"k1"), Err(CacheError::Storage(_))));
        assert!(cache.contains(b"k1"));
        assert_eq!(backend.value(b"k1"), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_stats() {
        let cache = LruCache::new(MemoryBackend::new(), 100, HOUR).unwrap();

        cache.add(b"key1", b"value1").unwrap();
        cache.get(b"key1").unwrap();
        cache.get(b"nonexistent").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
