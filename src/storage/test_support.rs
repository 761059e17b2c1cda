//! Test doubles for the storage layer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::StorageBackend;
use crate::error::StorageError;

#[derive(Debug, Default)]
struct Faults {
    put: bool,
    get: bool,
    delete: bool,
    panic_on_get: bool,
    read_delay: Duration,
}

/// In-memory backend whose contents and failure modes stay reachable from the
/// test after the engine takes ownership of a clone.
#[derive(Debug, Clone, Default)]
pub struct SharedBackend {
    values: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>,
    faults: Arc<Mutex<Faults>>,
}

impl SharedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> HashSet<Vec<u8>> {
        self.values.lock().keys().cloned().collect()
    }

    pub fn value(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.values.lock().get(key).cloned()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.faults.lock().put = fail;
    }

    pub fn fail_gets(&self, fail: bool) {
        self.faults.lock().get = fail;
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.faults.lock().delete = fail;
    }

    pub fn panic_on_get(&self, panic: bool) {
        self.faults.lock().panic_on_get = panic;
    }

    pub fn delay_reads(&self, delay: Duration) {
        self.faults.lock().read_delay = delay;
    }
}

impl StorageBackend for SharedBackend {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        if self.faults.lock().put {
            return Err(StorageError::Backend("injected write failure".to_string()));
        }
        self.values.lock().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let (fail, panic, delay) = {
            let faults = self.faults.lock();
            (faults.get, faults.panic_on_get, faults.read_delay)
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if panic {
            panic!("injected read panic");
        }
        if fail {
            return Err(StorageError::Backend("injected read failure".to_string()));
        }
        Ok(self.values.lock().get(key).cloned())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        if self.faults.lock().delete {
            return Err(StorageError::Backend("injected delete failure".to_string()));
        }
        self.values.lock().remove(key);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "shared-test"
    }
}
