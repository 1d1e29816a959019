//! Storage models.

use std::path::PathBuf;
use time::UtcDateTime;

/// File metadata returned by [`stat`](crate::StorageBackend::stat).
///
/// The modification time is what the archive cache keys on, so backends must
/// report a new value whenever the file contents are replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: UtcDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: UtcDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }
}
