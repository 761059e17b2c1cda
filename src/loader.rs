//! Pre-population Loader
//!
//! Feeds `key:value` records from a file into the cache before the server
//! starts accepting requests.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::error::{CacheError, Result};
use crate::service::CacheService;

/// Splits one `key:value` line. The line must contain exactly one `:`.
pub fn parse_record(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => Some((key, value)),
        _ => None,
    }
}

/// Loads every record of `path` through [`CacheService::add`], in file order.
///
/// Later duplicates overwrite earlier ones. Blank or whitespace-only lines
/// are skipped rather than rejected, so a trailing newline or spacer line is
/// not an error; every other line must hold exactly one `:`.
///
/// # Errors
/// `CacheError::Config` if the file cannot be read or a line is malformed;
/// `CacheError::Storage` if the backend rejects a write.
pub async fn populate_from_file(service: &CacheService, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let file = File::open(path).await.map_err(|e| {
        CacheError::Config(format!("cannot open {}: {}", path.display(), e))
    })?;

    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;
    let mut loaded = 0usize;

    while let Some(line) = lines.next_line().await.map_err(|e| {
        CacheError::Config(format!("cannot read {}: {}", path.display(), e))
    })? {
        line_no += 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let (key, value) = parse_record(line).ok_or_else(|| {
            CacheError::Config(format!(
                "invalid test data format at {}:{}",
                path.display(),
                line_no
            ))
        })?;
        service.add(key.as_bytes(), value.as_bytes())?;
        loaded += 1;
    }

    info!("Pre-populated {} records from {}", loaded, path.display());
    Ok(loaded)
}
