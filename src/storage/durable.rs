//! Durable storage on an embedded SQLite database.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::StorageBackend;
use crate::error::StorageError;

/// Database file created inside the data directory.
pub const DB_FILE_NAME: &str = "cache.db";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS entries (
    key   BLOB PRIMARY KEY,
    value BLOB NOT NULL
)";

/// Stores values in a single-table SQLite file.
///
/// Every statement runs in autocommit mode, so a successful `put` is on disk
/// once it returns.
#[derive(Debug)]
pub struct DurableBackend {
    conn: Option<Connection>,
    path: PathBuf,
}

impl DurableBackend {
    // == Open ==
    /// Opens (or creates) the store under `dir`, keeping any existing rows.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let path = dir.join(DB_FILE_NAME);
        let conn = Connection::open(&path)?;
        conn.execute_batch(CREATE_TABLE)?;

        info!("Opened durable store at {}", path.display());
        Ok(Self {
            conn: Some(conn),
            path,
        })
    }

    // == Open Fresh ==
    /// Opens the store under `dir` and discards rows left by a previous run.
    ///
    /// The recency order is not persisted, so leftover rows would never be
    /// reachable or evicted.
    pub fn open_fresh(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let mut backend = Self::open(dir)?;
        let dropped = backend.clear()?;
        if dropped > 0 {
            info!("Discarded {} values left by a previous run", dropped);
        }
        Ok(backend)
    }

    /// Deletes every row. Returns the number of rows removed.
    pub fn clear(&mut self) -> Result<usize, StorageError> {
        Ok(self.conn()?.execute("DELETE FROM entries", [])?)
    }

    /// Number of values on disk.
    pub fn len(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<&Connection, StorageError> {
        self.conn.as_ref().ok_or(StorageError::Closed)
    }
}

impl StorageBackend for DurableBackend {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO entries (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        self.conn()?
            .execute("DELETE FROM entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, err)| err)?;
            debug!("Closed durable store at {}", self.path.display());
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "durable"
    }
}
