//! Memoization of the ingestion step.
//!
//! Cleaning is expensive relative to filter/aggregate latency, so a session
//! ingests each distinct source once. The cache is an explicit object owned by
//! the calling layer: entries are keyed by a fingerprint of the source file
//! and invalidation is a method call, not an implicit global rerun.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info};

use crate::ingest::{self, CleanTable, LoadError};

/// Identity of a raw source at a point in time. A changed length or mtime
/// means the cached table no longer represents the file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceFingerprint {
    len: u64,
    modified: SystemTime,
}

fn fingerprint(path: &Path) -> Result<SourceFingerprint, LoadError> {
    let meta = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    Ok(SourceFingerprint {
        len: meta.len(),
        modified: meta.modified().unwrap_or(UNIX_EPOCH),
    })
}

/// Thread-safe map from source path to its cleaned table.
#[derive(Default)]
pub struct TableCache {
    entries: Mutex<HashMap<PathBuf, (SourceFingerprint, Arc<CleanTable>)>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, re-ingesting when the file's
    /// fingerprint has changed or the path has never been loaded.
    pub fn load_or_ingest(&self, path: impl AsRef<Path>) -> Result<Arc<CleanTable>, LoadError> {
        let path = path.as_ref();
        let current = fingerprint(path)?;

        {
            let entries = self.entries.lock().unwrap();
            if let Some((cached, table)) = entries.get(path) {
                if *cached == current {
                    debug!(path = %path.display(), "clean table served from cache");
                    return Ok(Arc::clone(table));
                }
            }
        }

        info!(path = %path.display(), "ingesting source");
        let table = Arc::new(ingest::load_clean(path)?);
        self.entries
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), (current, Arc::clone(&table)));
        Ok(table)
    }

    /// Drop the cached entry for `path`. Returns whether one existed.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        self.entries
            .lock()
            .unwrap()
            .remove(path.as_ref())
            .is_some()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
