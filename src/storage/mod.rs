//! Storage Module
//!
//! Value storage behind the eviction engine. The engine only needs put, get and
//! delete, so any backend offering those can be swapped in.
//!
//! # Backends
//! - `MemoryBackend`: process-memory map, nothing survives a restart
//! - `DurableBackend`: SQLite file on disk

mod durable;
mod memory;
#[cfg(test)]
pub(crate) mod test_support;

pub use durable::DurableBackend;
pub use memory::MemoryBackend;

use crate::error::StorageError;

// == Storage Backend ==
/// Raw value storage used by the eviction engine.
///
/// Calls are serialized by the engine's lock, so implementations only need to be
/// `Send`.
pub trait StorageBackend: Send {
    /// Stores `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Reads the value stored under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Removes `key`. Deleting an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError>;

    /// Flushes and releases backend resources at teardown.
    fn close(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Short name used in logs.
    fn kind(&self) -> &'static str;
}
