//! Admission Control
//!
//! Bounds how many requests may reach the cache at once. Callers that cannot get
//! a permit before their deadline are turned away instead of queuing forever.

use std::time::Duration;

use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::{CacheError, Result};

// == Admission Controller ==
/// Fixed-size pool of admission permits.
#[derive(Debug)]
pub struct AdmissionController {
    permits: Semaphore,
    max_concurrent: usize,
}

impl AdmissionController {
    /// Creates a pool of `max_concurrent` permits.
    ///
    /// # Errors
    /// `CacheError::Config` if `max_concurrent` is zero or above what the
    /// semaphore supports.
    pub fn new(max_concurrent: usize) -> Result<Self> {
        if max_concurrent == 0 {
            return Err(CacheError::Config(
                "max concurrent requests must be positive".to_string(),
            ));
        }
        if max_concurrent > Semaphore::MAX_PERMITS {
            return Err(CacheError::Config(format!(
                "max concurrent requests must not exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }

        Ok(Self {
            permits: Semaphore::new(max_concurrent),
            max_concurrent,
        })
    }

    // == Acquire ==
    /// Waits up to `deadline` for a permit.
    ///
    /// The permit returns to the pool when dropped, on every exit path including
    /// unwinding.
    ///
    /// # Errors
    /// `CacheError::AdmissionTimeout` if no permit frees up in time. Nothing is
    /// taken from the pool in that case.
    pub async fn acquire(&self, deadline: Duration) -> Result<AdmissionPermit<'_>> {
        match tokio::time::timeout(deadline, self.permits.acquire()).await {
            Ok(Ok(permit)) => Ok(AdmissionPermit { _permit: permit }),
            // The semaphore is never closed, so only the deadline can fail us.
            Ok(Err(_)) | Err(_) => Err(CacheError::AdmissionTimeout),
        }
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Permits currently checked out.
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.available()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

// == Admission Permit ==
/// A checked-out admission permit. Dropping it returns it to the pool.
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct AdmissionPermit<'a> {
    _permit: SemaphorePermit<'a>,
}

impl AdmissionPermit<'_> {
    /// Returns the permit to the pool now. Consumes it, so it can only happen once.
    pub fn release(self) {}
}
