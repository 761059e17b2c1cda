//! httplru - A bounded LRU/TTL cache served over JSON-RPC
//!
//! Keeps at most a fixed number of entries in a pluggable storage backend,
//! evicting by recency and expiring by idle time, with an admission pool in
//! front of every lookup.

pub mod admission;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod service;
pub mod storage;

pub use admission::AdmissionController;
pub use api::AppState;
pub use cache::LruCache;
pub use config::Config;
pub use error::{CacheError, StorageError};
pub use service::CacheService;
