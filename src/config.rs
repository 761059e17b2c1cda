//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};
use crate::storage::{DurableBackend, MemoryBackend, StorageBackend};

/// Which storage backend holds cached values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Values kept in process memory
    Memory,
    /// Values kept in an on-disk SQLite file
    Durable,
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "durable" => Ok(BackendKind::Durable),
            other => Err(CacheError::Config(format!(
                "unknown storage backend '{}', expected 'memory' or 'durable'",
                other
            ))),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of entries the cache can hold
    pub max_cached_entries: usize,
    /// Entries untouched for longer than this are expired
    pub ttl: Duration,
    /// Maximum number of lookups served concurrently
    pub max_concurrent: usize,
    /// Server-side request deadline, also the admission wait limit
    pub rpc_timeout: Duration,
    /// Where cached values are stored
    pub backend: BackendKind,
    /// Directory of the durable store
    pub data_dir: PathBuf,
    /// Optional `key:value` file loaded before serving
    pub test_data: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `MAX_CACHE_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_TTL` - Entry time-to-live (default: 1h)
    /// - `MAX_CONCURRENT_REQS` - Admission pool size (default: 100)
    /// - `RPC_TIMEOUT` - Request deadline (default: 60s)
    /// - `STORAGE_BACKEND` - `memory` or `durable` (default: durable)
    /// - `DATA_DIR` - Durable store directory (default: /tmp/httplru)
    /// - `TEST_DATA` - Pre-population file (default: unset)
    ///
    /// Durations take humantime strings such as `500ms`, `90s` or `1h 30m`. A
    /// bare number is read as seconds.
    ///
    /// # Errors
    /// `CacheError::Config` if a variable is set but cannot be parsed, or if the
    /// resulting values fail [`Config::validate`].
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            server_port: env_or("SERVER_PORT", defaults.server_port)?,
            max_cached_entries: env_or("MAX_CACHE_SIZE", defaults.max_cached_entries)?,
            ttl: env_duration_or("CACHE_TTL", defaults.ttl)?,
            max_concurrent: env_or("MAX_CONCURRENT_REQS", defaults.max_concurrent)?,
            rpc_timeout: env_duration_or("RPC_TIMEOUT", defaults.rpc_timeout)?,
            backend: env_or("STORAGE_BACKEND", defaults.backend)?,
            data_dir: env::var_os("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            test_data: env::var_os("TEST_DATA")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks that every limit is positive.
    pub fn validate(&self) -> Result<()> {
        if self.max_cached_entries == 0 {
            return Err(CacheError::Config(
                "MAX_CACHE_SIZE must be positive".to_string(),
            ));
        }
        if self.ttl.is_zero() {
            return Err(CacheError::Config("CACHE_TTL must be positive".to_string()));
        }
        if self.max_concurrent == 0 {
            return Err(CacheError::Config(
                "MAX_CONCURRENT_REQS must be positive".to_string(),
            ));
        }
        if self.rpc_timeout.is_zero() {
            return Err(CacheError::Config(
                "RPC_TIMEOUT must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Opens the configured storage backend.
    ///
    /// The durable store is reset on open since the recency order of a previous
    /// run cannot be recovered.
    ///
    /// # Errors
    /// `CacheError::Config` if the durable store cannot be opened.
    pub fn open_backend(&self) -> Result<Box<dyn StorageBackend>> {
        match self.backend {
            BackendKind::Memory => Ok(Box::new(MemoryBackend::new())),
            BackendKind::Durable => {
                let backend = DurableBackend::open_fresh(&self.data_dir).map_err(|e| {
                    CacheError::Config(format!(
                        "failed to open durable store at {}: {}",
                        self.data_dir.display(),
                        e
                    ))
                })?;
                Ok(Box::new(backend))
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            max_cached_entries: 1000,
            ttl: Duration::from_secs(3600),
            max_concurrent: 100,
            rpc_timeout: Duration::from_secs(60),
            backend: BackendKind::Durable,
            data_dir: PathBuf::from("/tmp/httplru"),
            test_data: None,
        }
    }
}

/// Reads and parses `name`, falling back to `default` when it is unset.
fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CacheError::Config(format!("invalid {}='{}': {}", name, raw, e))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(env::VarError::NotUnicode(_)) => {
            Err(CacheError::Config(format!("{} is not valid unicode", name)))
        }
    }
}

/// Reads a duration such as `500ms` or `2m`, falling back to `default` when unset.
fn env_duration_or(name: &str, default: Duration) -> Result<Duration> {
    match env::var(name) {
        Ok(raw) => parse_duration(&raw)
            .map_err(|e| CacheError::Config(format!("invalid {}='{}': {}", name, raw, e))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(env::VarError::NotUnicode(_)) => {
            Err(CacheError::Config(format!("{} is not valid unicode", name)))
        }
    }
}

/// Parses a humantime duration; a plain integer counts as seconds.
pub fn parse_duration(raw: &str) -> std::result::Result<Duration, humantime::DurationError> {
    let raw = raw.trim();
    match raw.parse::<u64>() {
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => humantime::parse_duration(raw),
    }
}
