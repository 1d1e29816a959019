//! The archive facade.
//!
//! An [`Archive`] is a handle on one container file. Every public operation
//! checks for cancellation first and reloads the container if the handle has
//! written to it since it was last read. Mutations never patch the container:
//! they copy the surviving entries into a brand-new container and replace the
//! file with it in one write.

use crate::context::Context;
use crate::entry::{Entry, natural_cmp, sort_canonical};
use crate::error::{ErrorKind, Result};
use crate::format::{ArchiveReader, ArchiveWriter};
use exn::{OptionExt, ResultExt};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tankobon_comicinfo::{ComicInfo, FILE_NAME, from_xml, to_xml};
use tankobon_storage::error::ErrorKind as StorageErrorKind;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Bytes of an image entry together with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub name: String,
    pub mime: &'static str,
    pub data: Vec<u8>,
}

/// What to do with one entry in [`Archive::rename_entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rename {
    To(String),
    Delete,
}

/// An empty name means delete.
impl From<String> for Rename {
    fn from(name: String) -> Self {
        if name.is_empty() { Self::Delete } else { Self::To(name) }
    }
}

impl From<&str> for Rename {
    fn from(name: &str) -> Self {
        name.to_string().into()
    }
}

pub struct Archive {
    pub(crate) ctx: Context,
    path: PathBuf,
    reader: Option<Arc<dyn ArchiveReader>>,
    dirty: bool,
    cancel: CancellationToken,
}

impl Archive {
    pub fn new(ctx: Context, path: impl Into<PathBuf>) -> Self {
        Self { ctx, path: path.into(), reader: None, dirty: false, cancel: CancellationToken::new() }
    }

    /// Abort operations once `cancel` is triggered.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this handle has written to the container since it last read it.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            tracing::debug!(path = %self.path.display(), "Request aborted");
            exn::bail!(ErrorKind::RequestAborted);
        }
        Ok(())
    }

    /// Open the container, from the cache when the file is unchanged.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub async fn load(&mut self) -> Result<()> {
        self.checkpoint()?;
        let format = self.ctx.formats.for_path(&self.path)?;
        let key = self.ctx.cache_key(&self.path)?;
        self.reader = None;
        if self.dirty {
            self.ctx.cache.evict(&key).await;
        }

        let info = match self.ctx.backend.stat(&self.path).await {
            Ok(info) => info,
            Err(e) if matches!(e.deref(), StorageErrorKind::NotFound(_)) => {
                return Err(e).or_raise(|| ErrorKind::NotFound(self.path.clone()));
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Storage),
        };

        let reader = match self.ctx.cache.get(&key, info.modified).await {
            Some(reader) => reader,
            None => {
                let data = self.ctx.backend.read(&self.path).await.or_raise(|| ErrorKind::Storage)?;
                let reader = tokio::task::spawn_blocking(move || format.open(data))
                    .await
                    .or_raise(|| ErrorKind::MalformedContainer)??;
                self.ctx.cache.put(key, info.modified, reader.clone()).await;
                tracing::debug!(size = info.size, "Opened archive");
                reader
            },
        };
        self.reader = Some(reader);
        self.dirty = false;
        Ok(())
    }

    /// The open reader, reloading first when dirty or when the cache closed it.
    pub(crate) async fn reader(&mut self) -> Result<Arc<dyn ArchiveReader>> {
        self.checkpoint()?;
        if let Some(reader) = &self.reader
            && !self.dirty
            && !reader.is_closed()
        {
            return Ok(reader.clone());
        }
        self.load().await?;
        self.reader.clone().ok_or_raise(|| ErrorKind::ReaderClosed)
    }

    /// Reader plus entries in canonical order.
    pub(crate) async fn snapshot(&mut self) -> Result<(Arc<dyn ArchiveReader>, Vec<Entry>)> {
        let reader = self.reader().await?;
        let mut entries: Vec<Entry> = reader.names()?.into_iter().map(Entry::new).collect();
        sort_canonical(&mut entries);
        Ok((reader, entries))
    }

    pub(crate) fn create_writer(&self) -> Result<Box<dyn ArchiveWriter>> {
        self.ctx.create_writer(&self.path)
    }

    /// Store `writer` at `path` unless the request was cancelled. The cached
    /// reader for `path` is left open.
    pub(crate) async fn write_container(&self, path: &Path, writer: Box<dyn ArchiveWriter>) -> Result<()> {
        self.checkpoint()?;
        self.ctx.write_container(path, writer).await
    }

    /// Replace this archive with `writer`'s container.
    pub(crate) async fn commit(&mut self, writer: Box<dyn ArchiveWriter>) -> Result<()> {
        let path = self.path.clone();
        self.write_container(&path, writer).await?;
        self.ctx.invalidate(&path).await?;
        self.dirty = true;
        Ok(())
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// All entries, sorted by name with ordinal comparison.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub async fn entries(&mut self) -> Result<Vec<Entry>> {
        Ok(self.snapshot().await?.1)
    }

    /// The embedded ComicInfo record, or an empty record when there is none.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub async fn metadata(&mut self) -> Result<ComicInfo> {
        let (reader, entries) = self.snapshot().await?;
        let Some(entry) = entries.iter().find(|entry| entry.is_metadata()) else {
            return Ok(ComicInfo::default());
        };
        let xml = String::from_utf8(reader.read(&entry.name)?).or_raise(|| ErrorKind::Metadata)?;
        from_xml(xml.trim_start_matches('\u{feff}')).or_raise(|| ErrorKind::Metadata)
    }

    /// Replace the embedded ComicInfo record with `info`.
    #[instrument(skip(self, info), fields(path = %self.path.display()))]
    pub async fn set_metadata(&mut self, info: &ComicInfo) -> Result<()> {
        let (reader, entries) = self.snapshot().await?;
        let xml = to_xml(info).or_raise(|| ErrorKind::Metadata)?;
        let mut writer = self.create_writer()?;
        for entry in entries.iter().filter(|entry| !entry.is_metadata()) {
            self.checkpoint()?;
            copy_entry(reader.as_ref(), writer.as_mut(), entry, &entry.name)?;
        }
        writer.add_file(FILE_NAME, xml.as_bytes())?;
        self.commit(writer).await
    }

    /// Rewrite the archive keeping only the entries named in `renames`.
    ///
    /// Entries missing from the map, or mapped to [`Rename::Delete`], are
    /// dropped. Contents are copied untouched.
    #[instrument(skip(self, renames), fields(path = %self.path.display(), renames = renames.len()))]
    pub async fn rename_entries(&mut self, renames: &BTreeMap<String, Rename>) -> Result<()> {
        let (reader, entries) = self.snapshot().await?;
        let mut writer = self.create_writer()?;
        for entry in &entries {
            self.checkpoint()?;
            match renames.get(&entry.name) {
                Some(Rename::To(name)) => copy_entry(reader.as_ref(), writer.as_mut(), entry, name)?,
                Some(Rename::Delete) | None => tracing::debug!(entry = %entry.name, "Dropping entry"),
            }
        }
        self.commit(writer).await
    }

    /// Move every file to the top level. Directory entries are dropped.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn flatten(&mut self) -> Result<()> {
        let (reader, entries) = self.snapshot().await?;
        let mut writer = self.create_writer()?;
        for entry in entries.iter().filter(|entry| !entry.is_directory) {
            self.checkpoint()?;
            copy_entry(reader.as_ref(), writer.as_mut(), entry, &entry.file_name())?;
        }
        self.commit(writer).await
    }

    /// Pass every image through the context's EXIF stripper.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn remove_exif(&mut self) -> Result<()> {
        let (reader, entries) = self.snapshot().await?;
        let mut writer = self.create_writer()?;
        for entry in &entries {
            self.checkpoint()?;
            if entry.is_directory {
                writer.add_directory(&entry.name)?;
                continue;
            }
            let data = reader.read(&entry.name)?;
            let data = match entry.mime {
                Some(mime) if mime.starts_with("image/") => {
                    self.ctx.exif.strip(data, mime).await.or_raise(|| ErrorKind::Image)?
                },
                _ => data,
            };
            writer.add_file(&entry.name, &data)?;
        }
        self.commit(writer).await
    }

    /// The cover image.
    ///
    /// Images are walked in natural order. The first one is the cover unless
    /// a later image has "cover" in its name; if several do, the last wins.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub async fn cover(&mut self) -> Result<Option<Image>> {
        let (reader, mut entries) = self.snapshot().await?;
        entries.sort_by(natural_cmp);
        let mut chosen: Option<&Entry> = None;
        for entry in entries.iter().filter(|entry| entry.is_image) {
            if chosen.is_none() || entry.is_cover {
                chosen = Some(entry);
            }
        }
        chosen.map(|entry| load_image(reader.as_ref(), entry)).transpose()
    }

    /// Make `name` the cover: existing cover-named files are dropped and
    /// `name` is copied to `cover<ext>` at the top level.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn set_cover(&mut self, name: &str) -> Result<()> {
        let (reader, entries) = self.snapshot().await?;
        let target = entries
            .iter()
            .find(|entry| entry.is_image && entry.name == name)
            .ok_or_raise(|| ErrorKind::EntryNotFound(name.to_string()))?;
        let mut writer = self.create_writer()?;
        for entry in entries.iter().filter(|entry| !entry.is_cover) {
            self.checkpoint()?;
            copy_entry(reader.as_ref(), writer.as_mut(), entry, &entry.name)?;
        }
        writer.add_file(&format!("cover{}", target.ext), &reader.read(&target.name)?)?;
        self.commit(writer).await
    }

    /// An image entry by exact name.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub async fn image(&mut self, name: &str) -> Result<Option<Image>> {
        let (reader, entries) = self.snapshot().await?;
        entries
            .iter()
            .find(|entry| entry.is_image && entry.name == name)
            .map(|entry| load_image(reader.as_ref(), entry))
            .transpose()
    }

    /// Raw bytes of any file entry.
    pub async fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let reader = self.reader().await?;
        if name.ends_with('/') {
            exn::bail!(ErrorKind::EntryNotFound(name.to_string()));
        }
        reader.read(name)
    }
}

pub(crate) fn copy_entry(
    reader: &dyn ArchiveReader,
    writer: &mut dyn ArchiveWriter,
    entry: &Entry,
    name: &str,
) -> Result<()> {
    if entry.is_directory {
        writer.add_directory(name)
    } else {
        writer.add_file(name, &reader.read(&entry.name)?)
    }
}

fn load_image(reader: &dyn ArchiveReader, entry: &Entry) -> Result<Image> {
    Ok(Image {
        name: entry.name.clone(),
        mime: entry.mime.unwrap_or("application/octet-stream"),
        data: reader.read(&entry.name)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ArchiveFormat;
    use crate::testing::{fixture, names};
    use tankobon_comicinfo::{Page, PageType};
    use tankobon_storage::backend::StorageBackend;
    use time::UtcDateTime;

    #[tokio::test]
    async fn entries_are_sorted_ordinally() {
        let (_, ctx) = fixture(&[("b.jpg", b"b"), ("A/", b""), ("a10.jpg", b"x"), ("a2.jpg", b"y")]);
        let mut archive = ctx.open("Saga 001.cbz");
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["A/", "a10.jpg", "a2.jpg", "b.jpg"]);
    }

    #[tokio::test]
    async fn unsupported_extension_fails_before_io() {
        let (_, ctx) = fixture(&[("p1.jpg", b"x")]);
        let err = ctx.open("Saga 001.cbr").entries().await.unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(".cbr".to_string()));
    }

    #[tokio::test]
    async fn missing_archive_is_not_found() {
        let (_, ctx) = fixture(&[("p1.jpg", b"x")]);
        let err = ctx.open("Missing.cbz").entries().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn corrupt_container_is_malformed() {
        let backend = Arc::new(tankobon_storage::backend::MockBackend::with_files([("Bad.cbz", b"nope".to_vec())]));
        let ctx = Context::new(backend);
        let err = ctx.open("Bad.cbz").entries().await.unwrap_err();
        assert_eq!(*err, ErrorKind::MalformedContainer);
    }

    #[tokio::test]
    async fn cancelled_operations_fail_fast() {
        let (_, ctx) = fixture(&[("p1.jpg", b"x")]);
        let token = CancellationToken::new();
        let mut archive = ctx.open("Saga 001.cbz").with_cancellation(token.clone());
        token.cancel();
        let err = archive.flatten().await.unwrap_err();
        assert!(err.is_aborted());
        assert!(archive.reader.is_none());
    }

    #[tokio::test]
    async fn metadata_defaults_when_absent() {
        let (_, ctx) = fixture(&[("p1.jpg", b"x")]);
        assert!(ctx.open("Saga 001.cbz").metadata().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn metadata_is_found_case_insensitively() {
        let xml = b"<ComicInfo><Series>Saga</Series></ComicInfo>";
        let (_, ctx) = fixture(&[("p1.jpg", b"x"), ("comicinfo.XML", xml)]);
        let info = ctx.open("Saga 001.cbz").metadata().await.unwrap();
        assert_eq!(info.series.as_deref(), Some("Saga"));
    }

    #[tokio::test]
    async fn set_metadata_replaces_document_and_reloads() {
        let xml = b"<ComicInfo><Series>Old</Series><Title>Kept?</Title></ComicInfo>";
        let (_, ctx) = fixture(&[("p1.jpg", b"x"), ("comicinfo.xml", xml)]);
        let mut archive = ctx.open("Saga 001.cbz");
        assert_eq!(archive.metadata().await.unwrap().series.as_deref(), Some("Old"));

        let info = ComicInfo {
            series: Some("Saga".to_string()),
            pages: vec![Page::new(0, PageType::FrontCover)],
            ..ComicInfo::default()
        };
        archive.set_metadata(&info).await.unwrap();
        assert!(archive.is_dirty());

        assert_eq!(archive.metadata().await.unwrap(), info);
        assert!(!archive.is_dirty());
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["ComicInfo.xml", "p1.jpg"]);
    }

    #[tokio::test]
    async fn rename_entries_drops_unmapped_and_deleted() {
        let (_, ctx) = fixture(&[("a.jpg", b"a"), ("b.jpg", b"b"), ("c.jpg", b"c"), ("d/", b"")]);
        let mut archive = ctx.open("Saga 001.cbz");
        let renames = BTreeMap::from([
            ("a.jpg".to_string(), Rename::from("001.jpg")),
            ("b.jpg".to_string(), Rename::from("")),
            ("d/".to_string(), Rename::from("pages/")),
        ]);
        archive.rename_entries(&renames).await.unwrap();
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["001.jpg", "pages/"]);
        assert_eq!(archive.read_entry("001.jpg").await.unwrap(), b"a");
    }

    #[tokio::test]
    async fn flatten_drops_directories() {
        let (_, ctx) = fixture(&[("Saga/", b""), ("Saga/Ch 1/", b""), ("Saga/Ch 1/p1.jpg", b"1"), ("top.txt", b"t")]);
        let mut archive = ctx.open("Saga 001.cbz");
        archive.flatten().await.unwrap();
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["p1.jpg", "top.txt"]);
    }

    #[tokio::test]
    async fn remove_exif_only_touches_images() {
        let png = crate::testing::png(3, 2, [9, 8, 7, 255]);
        let (_, ctx) = fixture(&[("p1.png", &png), ("notes.txt", b"keep me"), ("d/", b"")]);
        let mut archive = ctx.open("Saga 001.cbz");
        archive.remove_exif().await.unwrap();
        assert_eq!(archive.read_entry("notes.txt").await.unwrap(), b"keep me");
        let stripped = archive.read_entry("p1.png").await.unwrap();
        let image = image::load_from_memory(&stripped).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["d/", "notes.txt", "p1.png"]);
    }

    #[tokio::test]
    async fn cover_prefers_last_cover_named_image() {
        let (_, ctx) =
            fixture(&[("a.jpg", b"a"), ("cover.png", b"c1"), ("b.jpg", b"b"), ("Cover2.png", b"c2"), ("x.txt", b"")]);
        let cover = ctx.open("Saga 001.cbz").cover().await.unwrap().unwrap();
        assert_eq!(cover.name, "Cover2.png");
        assert_eq!(cover.mime, "image/png");
        assert_eq!(cover.data, b"c2");
    }

    #[tokio::test]
    async fn cover_defaults_to_first_image_in_natural_order() {
        let (_, ctx) = fixture(&[("p10.jpg", b"10"), ("p2.jpg", b"2"), ("ComicInfo.xml", b"<ComicInfo/>")]);
        let cover = ctx.open("Saga 001.cbz").cover().await.unwrap().unwrap();
        assert_eq!(cover.name, "p2.jpg");
        let (_, ctx) = fixture(&[("ComicInfo.xml", b"<ComicInfo/>")]);
        assert!(ctx.open("Saga 001.cbz").cover().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_cover_replaces_existing_covers() {
        let (_, ctx) = fixture(&[("cover.jpg", b"old"), ("p1.png", b"one"), ("p2.png", b"two")]);
        let mut archive = ctx.open("Saga 001.cbz");
        archive.set_cover("p2.png").await.unwrap();
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["cover.png", "p1.png", "p2.png"]);
        assert_eq!(archive.cover().await.unwrap().unwrap().data, b"two");
        let err = archive.set_cover("missing.png").await.unwrap_err();
        assert_eq!(*err, ErrorKind::EntryNotFound("missing.png".to_string()));
    }

    #[tokio::test]
    async fn image_lookup_is_exact_and_images_only() {
        let (_, ctx) = fixture(&[("p1.jpg", b"one"), ("notes.txt", b"text")]);
        let mut archive = ctx.open("Saga 001.cbz");
        assert_eq!(archive.image("p1.jpg").await.unwrap().unwrap().mime, "image/jpeg");
        assert!(archive.image("P1.jpg").await.unwrap().is_none());
        assert!(archive.image("notes.txt").await.unwrap().is_none());
        assert_eq!(archive.read_entry("notes.txt").await.unwrap(), b"text");
    }

    #[tokio::test]
    async fn unchanged_file_reuses_cached_reader() {
        let (_, ctx) = fixture(&[("p1.jpg", b"x")]);
        let mut first = ctx.open("Saga 001.cbz");
        first.entries().await.unwrap();
        let mut second = ctx.open("Saga 001.cbz");
        second.entries().await.unwrap();
        assert!(Arc::ptr_eq(first.reader.as_ref().unwrap(), second.reader.as_ref().unwrap()));
    }

    #[tokio::test]
    async fn changed_mtime_opens_fresh_reader() {
        let (backend, ctx) = fixture(&[("p1.jpg", b"x")]);
        let mut first = ctx.open("Saga 001.cbz");
        first.entries().await.unwrap();
        let stale = first.reader.clone().unwrap();

        let later = UtcDateTime::from_unix_timestamp(2_000_000_000).unwrap();
        backend.set_modified(Path::new("Saga 001.cbz"), later).await.unwrap();
        let mut second = ctx.open("Saga 001.cbz");
        second.entries().await.unwrap();
        assert!(stale.is_closed());
        assert!(!Arc::ptr_eq(&stale, second.reader.as_ref().unwrap()));

        // The first handle notices its reader was closed and reloads.
        assert_eq!(names(&first.entries().await.unwrap()), vec!["p1.jpg"]);
    }

    #[tokio::test]
    async fn writes_are_visible_to_other_handles() {
        let (backend, ctx) = fixture(&[("p1.jpg", b"x"), ("p2.jpg", b"y")]);
        let mut reader = ctx.open("Saga 001.cbz");
        reader.entries().await.unwrap();
        let mut writer = ctx.open("Saga 001.cbz");
        writer.rename_entries(&BTreeMap::from([("p1.jpg".to_string(), Rename::from("p1.jpg"))])).await.unwrap();
        assert_eq!(names(&reader.entries().await.unwrap()), vec!["p1.jpg"]);
        let stored = backend.read(Path::new("Saga 001.cbz")).await.unwrap();
        let reopened = crate::format::ZipFormat.open(stored).unwrap();
        assert_eq!(reopened.names().unwrap(), vec!["p1.jpg"]);
    }
}
