//! Error types for the cache server
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Storage Error Enum ==
/// Failure raised by a storage backend while reading, writing or deleting a value.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The embedded SQLite engine rejected the operation
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure around the durable store
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The backend has already been closed
    #[error("storage backend is closed")]
    Closed,

    /// Any other backend-specific failure
    #[error("{0}")]
    Backend(String),
}

// == Cache Error Enum ==
/// Unified error type for the cache server.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent or expired at lookup time
    #[error("record not found for: {0}")]
    NotFound(String),

    /// Admission pool stayed saturated past the deadline
    #[error("timed out: too many ongoing requests")]
    AdmissionTimeout,

    /// The storage backend failed
    #[error("storage fault: {0}")]
    Storage(#[from] StorageError),

    /// Invalid configuration or startup input
    #[error("configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Builds a `NotFound` for a raw byte key.
    pub fn not_found(key: &[u8]) -> Self {
        CacheError::NotFound(String::from_utf8_lossy(key).into_owned())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;
