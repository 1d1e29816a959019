//! Single-slot reader cache.
//!
//! Holds at most one open reader. Consecutive operations on the same archive
//! reuse it as long as the file's modification time is unchanged; touching
//! any other archive closes it.

use crate::format::ArchiveReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::UtcDateTime;
use tokio::sync::Mutex;

/// Identifies an archive across backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    backend: String,
    path: PathBuf,
}

impl CacheKey {
    pub fn new(backend: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self { backend: backend.into(), path: path.as_ref().to_path_buf() }
    }
}

struct Slot {
    key: CacheKey,
    modified: UtcDateTime,
    reader: Arc<dyn ArchiveReader>,
}

#[derive(Default)]
pub struct ArchiveCache {
    slot: Mutex<Option<Slot>>,
}

impl ArchiveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached reader for `key`, if it was opened from a file with the same
    /// modification time. Any other occupant is closed and evicted.
    pub async fn get(&self, key: &CacheKey, modified: UtcDateTime) -> Option<Arc<dyn ArchiveReader>> {
        let mut slot = self.slot.lock().await;
        let hit = slot
            .as_ref()
            .filter(|current| current.key == *key && current.modified == modified && !current.reader.is_closed())
            .map(|current| current.reader.clone());
        if hit.is_some() {
            tracing::trace!(?key, "Archive cache hit");
            return hit;
        }
        if let Some(stale) = slot.take() {
            tracing::trace!(key = ?stale.key, "Closing stale cached reader");
            stale.reader.close();
        }
        None
    }

    /// Store `reader`, closing whatever reader was cached before.
    pub async fn put(&self, key: CacheKey, modified: UtcDateTime, reader: Arc<dyn ArchiveReader>) {
        let mut slot = self.slot.lock().await;
        if let Some(previous) = slot.take()
            && !Arc::ptr_eq(&previous.reader, &reader)
        {
            previous.reader.close();
        }
        *slot = Some(Slot { key, modified, reader });
    }

    /// Close and drop the cached reader if it belongs to `key`.
    pub async fn evict(&self, key: &CacheKey) {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|current| current.key == *key)
            && let Some(evicted) = slot.take()
        {
            evicted.reader.close();
        }
    }

    /// Close and drop whatever is cached.
    pub async fn clear(&self) {
        if let Some(evicted) = self.slot.lock().await.take() {
            evicted.reader.close();
        }
    }
}
