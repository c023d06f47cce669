/// Content-addressed cache for the load step.
///
/// Parsed series are keyed by the SHA-256 of the file bytes, so re-reading an
/// unchanged file never re-parses, while any edit to the file yields a fresh
/// entry. Each path remembers the hash it last resolved to; when an edit
/// supersedes a hash that no other path still references, the stale series is
/// dropped, so repeated edits never grow the cache. The cache is explicit
/// shared state passed to whoever needs it, not a memoized global.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::simulation::Observation;
use crate::services::loader::{self, LoaderError};

#[derive(Debug, Default)]
struct CacheInner {
    /// Content hash → parsed series
    entries: HashMap<String, Arc<Vec<Observation>>>,
    /// File path → content hash it last resolved to
    by_path: HashMap<PathBuf, String>,
}

impl CacheInner {
    /// Point `path` at `key`, dropping the series it previously pointed at
    /// when no other path still references it.
    fn rebind(&mut self, path: &Path, key: &str) {
        if let Some(old) = self.by_path.insert(path.to_path_buf(), key.to_string()) {
            if old != key && !self.by_path.values().any(|k| *k == old) {
                self.entries.remove(&old);
                debug!(key = old, "superseded dataset entry dropped");
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DatasetCache {
    inner: Arc<RwLock<CacheInner>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dataset through the cache. The file is always read to compute
    /// its content hash; only the parse is skipped on a hit.
    pub fn load(&self, path: &Path) -> Result<Arc<Vec<Observation>>, LoaderError> {
        let bytes = std::fs::read(path)?;
        let key = content_key(&bytes);

        if let Ok(mut inner) = self.inner.write() {
            if let Some(series) = inner.entries.get(&key).cloned() {
                debug!(path = %path.display(), key, "dataset cache hit");
                inner.rebind(path, &key);
                return Ok(series);
            }
        }

        // Parse outside the lock; only the insert needs exclusivity.
        let series = Arc::new(loader::parse_observations(bytes.as_slice())?);
        debug!(
            path = %path.display(),
            key,
            records = series.len(),
            "dataset parsed and cached"
        );

        if let Ok(mut inner) = self.inner.write() {
            inner.entries.insert(key.clone(), Arc::clone(&series));
            inner.rebind(path, &key);
        }
        Ok(series)
    }

    pub fn entry_count(&self) -> usize {
        self.inner.read().map(|inner| inner.entries.len()).unwrap_or(0)
    }
}

fn content_key(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
