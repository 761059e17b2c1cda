//! Cache Service
//!
//! The two operations the transport layer consumes: admitted reads and
//! unthrottled pre-population writes.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::admission::AdmissionController;
use crate::cache::{CacheStats, LruCache};
use crate::error::{CacheError, Result, StorageError};

/// Point-in-time view of the service for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    #[serde(flatten)]
    pub cache: CacheStats,
    /// Size of the admission pool
    pub max_concurrent: usize,
    /// Requests currently admitted
    pub in_flight: usize,
    /// Permits free right now
    pub available_permits: usize,
}

// == Cache Service ==
/// Admission-controlled front of the eviction engine.
#[derive(Debug)]
pub struct CacheService {
    cache: Arc<LruCache>,
    admission: AdmissionController,
    rpc_timeout: Duration,
}

impl CacheService {
    /// Wires an engine and an admission pool together. `rpc_timeout` doubles as
    /// the admission deadline.
    pub fn new(cache: LruCache, admission: AdmissionController, rpc_timeout: Duration) -> Self {
        Self {
            cache: Arc::new(cache),
            admission,
            rpc_timeout,
        }
    }

    // == Get ==
    /// Reads `key` once admitted.
    ///
    /// The engine call runs on the blocking pool, so a slow backend never stalls
    /// the async workers that enforce other callers' admission deadlines. The
    /// permit is held until the call returns.
    ///
    /// # Errors
    /// - `CacheError::AdmissionTimeout` if no permit frees up within the RPC timeout
    /// - `CacheError::NotFound` if the key is absent or expired
    /// - `CacheError::Storage` if the backend fails
    pub async fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let _permit = self.admission.acquire(self.rpc_timeout).await.map_err(|err| {
            warn!(
                "Rejected lookup for {}: {}",
                String::from_utf8_lossy(key),
                err
            );
            err
        })?;

        let cache = Arc::clone(&self.cache);
        let owned_key = key.to_vec();
        let lookup = asyncify(move || cache.get(&owned_key)).await;

        match lookup {
            Ok(Some(value)) => Ok(value),
            Ok(None) => {
                debug!("Miss for {}", String::from_utf8_lossy(key));
                Err(CacheError::not_found(key))
            }
            Err(err) => {
                error!(
                    "Lookup for {} failed: {}",
                    String::from_utf8_lossy(key),
                    err
                );
                Err(err)
            }
        }
    }

    // == Add ==
    /// Writes `key` straight to the engine, skipping admission.
    ///
    /// Meant for pre-population before external traffic is accepted.
    pub fn add(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.cache.add(key, value)
    }

    // == Stats ==
    pub fn stats(&self) -> ServiceStats {
        let available_permits = self.admission.available();
        ServiceStats {
            cache: self.cache.stats(),
            max_concurrent: self.admission.max_concurrent(),
            in_flight: self.admission.max_concurrent() - available_permits,
            available_permits,
        }
    }

    // == Shutdown ==
    /// Closes the storage backend.
    pub fn shutdown(&self) -> Result<()> {
        self.cache.close()
    }

    pub fn cache(&self) -> &LruCache {
        &self.cache
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }
}

/// Runs a blocking engine call on tokio's blocking pool.
///
/// A panic inside `f` is resumed on the caller.
async fn asyncify<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => {
            Err(StorageError::Backend(format!("lookup task cancelled: {}", err)).into())
        }
    }
}
