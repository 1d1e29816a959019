//! Container formats.
//!
//! A format knows how to open an existing container for reading and how to
//! build a new one from scratch. There is no in-place editing: every change
//! to an archive is a complete new container written over the old file.

mod zip;

pub use self::zip::ZipFormat;
use crate::error::{ErrorKind, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// An opened container.
///
/// Readers are shared between the cache and any number of archive handles,
/// so every method takes `&self`.
pub trait ArchiveReader: Send + Sync {
    /// Member names, in container order. Directories end with `/`.
    fn names(&self) -> Result<Vec<String>>;

    /// Bytes of one member.
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Release the container. Further calls fail with
    /// [`ReaderClosed`](ErrorKind::ReaderClosed).
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// A new, initially empty container.
pub trait ArchiveWriter: Send {
    /// Add a file member. A name that was already added is skipped.
    fn add_file(&mut self, name: &str, data: &[u8]) -> Result<()>;

    /// Add a directory member.
    fn add_directory(&mut self, name: &str) -> Result<()>;

    /// Serialize the finished container.
    fn finish(self: Box<Self>) -> Result<Vec<u8>>;
}

/// Factory for readers and writers of one container type.
pub trait ArchiveFormat: Send + Sync {
    fn name(&self) -> &'static str;

    fn open(&self, data: Vec<u8>) -> Result<Arc<dyn ArchiveReader>>;

    fn create(&self) -> Box<dyn ArchiveWriter>;
}

/// Maps file extensions to container formats.
#[derive(Clone)]
pub struct FormatRegistry {
    formats: HashMap<String, Arc<dyn ArchiveFormat>>,
}

impl FormatRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self { formats: HashMap::new() }
    }

    /// Register `format` for `extension` (case-insensitive, dot optional),
    /// replacing any previous registration.
    pub fn register(&mut self, extension: &str, format: Arc<dyn ArchiveFormat>) -> &mut Self {
        self.formats.insert(normalize(extension), format);
        self
    }

    /// Format for the extension of `path`.
    pub fn for_path(&self, path: &Path) -> Result<Arc<dyn ArchiveFormat>> {
        let extension = path.extension().map(|ext| ext.to_string_lossy().into_owned()).unwrap_or_default();
        self.formats
            .get(&normalize(&extension))
            .cloned()
            .ok_or_else(|| exn::Exn::from(ErrorKind::UnsupportedFormat(format!(".{extension}"))))
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.for_path(path).is_ok()
    }
}

/// Registers zip for `.cbz` and `.zip`.
impl Default for FormatRegistry {
    fn default() -> Self {
        let zip: Arc<dyn ArchiveFormat> = Arc::new(ZipFormat);
        let mut registry = Self::empty();
        registry.register("cbz", zip.clone()).register("zip", zip);
        registry
    }
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Saga/Saga 001.cbz", true)]
    #[case("Saga 001.CBZ", true)]
    #[case("bundle.zip", true)]
    #[case("Saga 001.cbr", false)]
    #[case("no-extension", false)]
    fn default_registry(#[case] path: &str, #[case] supported: bool) {
        assert_eq!(FormatRegistry::default().supports(Path::new(path)), supported);
    }

    #[test]
    fn unsupported_format_names_the_extension() {
        let err = FormatRegistry::default().for_path(Path::new("issue.cb7")).err().unwrap();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(".cb7".to_string()));
    }

    #[test]
    fn register_new_extension() {
        let mut registry = FormatRegistry::empty();
        assert!(!registry.supports(Path::new("a.cbz")));
        registry.register(".CBZ", Arc::new(ZipFormat));
        assert_eq!(registry.for_path(Path::new("a.cbz")).ok().map(|f| f.name()), Some("zip"));
    }
}
