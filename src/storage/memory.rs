//! Ephemeral in-process storage.

use std::collections::HashMap;

use super::StorageBackend;
use crate::error::StorageError;

/// Keeps values in a `HashMap` owned by the engine.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: HashMap<Vec<u8>, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.values.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
