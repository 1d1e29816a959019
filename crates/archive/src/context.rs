use crate::archive::Archive;
use crate::cache::{ArchiveCache, CacheKey};
use crate::error::{ErrorKind, Result};
use crate::format::{ArchiveWriter, FormatRegistry};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tankobon_imaging::{EncodeOptions, ExifStripper, Reencoder};
use tankobon_storage::{BackendHandle, validate_path};

/// Everything an [`Archive`] needs besides its path.
///
/// Construct one per process (or per test) and hand out archives with
/// [`open`](Self::open). Cloning is cheap; clones share the cache.
#[derive(Clone)]
pub struct Context {
    pub(crate) backend: BackendHandle,
    pub(crate) cache: Arc<ArchiveCache>,
    pub(crate) formats: Arc<FormatRegistry>,
    pub(crate) exif: Arc<dyn ExifStripper>,
    pub(crate) encode: EncodeOptions,
}

impl Context {
    /// A context with a fresh cache, the default formats and a re-encoding
    /// EXIF stripper.
    pub fn new(backend: BackendHandle) -> Self {
        let encode = EncodeOptions::default();
        Self {
            backend,
            cache: Arc::new(ArchiveCache::new()),
            formats: Arc::new(FormatRegistry::default()),
            exif: Arc::new(Reencoder::new(encode)),
            encode,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ArchiveCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Arc::new(formats);
        self
    }

    pub fn with_exif_stripper(mut self, exif: Arc<dyn ExifStripper>) -> Self {
        self.exif = exif;
        self
    }

    /// Encoder settings for re-encoded images. Also rebuilds the default
    /// EXIF stripper so both paths agree.
    pub fn with_encode_options(mut self, encode: EncodeOptions) -> Self {
        self.encode = encode;
        self.exif = Arc::new(Reencoder::new(encode));
        self
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// An archive handle for `path`. Nothing is read until the first
    /// operation.
    pub fn open(&self, path: impl Into<PathBuf>) -> Archive {
        Archive::new(self.clone(), path)
    }

    /// Cache key for `path` on this context's backend.
    pub fn cache_key(&self, path: &Path) -> Result<CacheKey> {
        let validated = validate_path(path).or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?;
        Ok(CacheKey::new(self.backend.name(), validated))
    }

    /// An empty container in the format registered for `path`.
    pub fn create_writer(&self, path: &Path) -> Result<Box<dyn ArchiveWriter>> {
        Ok(self.formats.for_path(path)?.create())
    }

    /// Finish `writer` and replace the file at `path` with it.
    pub async fn write_container(&self, path: &Path, writer: Box<dyn ArchiveWriter>) -> Result<()> {
        let data = writer.finish()?;
        self.backend.write(path, &data).await.or_raise(|| ErrorKind::Storage)?;
        tracing::info!(path = %path.display(), size = data.len(), "Wrote archive");
        Ok(())
    }

    /// Close the cached reader for `path`, if there is one.
    pub async fn invalidate(&self, path: &Path) -> Result<()> {
        self.cache.evict(&self.cache_key(path)?).await;
        Ok(())
    }

    /// [`write_container`](Self::write_container) followed by
    /// [`invalidate`](Self::invalidate).
    pub async fn commit(&self, path: &Path, writer: Box<dyn ArchiveWriter>) -> Result<()> {
        self.write_container(path, writer).await?;
        self.invalidate(path).await
    }
}
