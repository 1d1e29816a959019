//! Fixtures shared by the planner tests.

use std::sync::Arc;

use tankobon_archive::format::{ArchiveFormat, ZipFormat};
use tankobon_archive::{Context, Entry};
use tankobon_storage::backend::MockBackend;

pub(crate) const ARCHIVE: &str = "Saga 001.cbz";

pub(crate) fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipFormat.create();
    for (name, data) in files {
        if name.ends_with('/') {
            writer.add_directory(name).unwrap();
        } else {
            writer.add_file(name, data).unwrap();
        }
    }
    writer.finish().unwrap()
}

/// An in-memory backend holding `Saga 001.cbz` with `files`, and a context
/// over it.
pub(crate) fn fixture(files: &[(&str, &[u8])]) -> (Arc<MockBackend>, Context) {
    let backend = Arc::new(MockBackend::with_files([(ARCHIVE, zip_bytes(files))]));
    let ctx = Context::new(backend.clone());
    (backend, ctx)
}

pub(crate) fn names(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.name.as_str()).collect()
}
