//! Cache Module
//!
//! The eviction engine: LRU ordering with lazy TTL expiry over a storage backend.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::LruCache;
