//! Zip containers (`.cbz`, `.zip`).

use super::{ArchiveFormat, ArchiveReader, ArchiveWriter};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use ::zip::write::FileOptions;
use ::zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Upper bound on the buffer reserved from a member's declared size. The
/// header is untrusted; anything larger grows as the data actually arrives.
const PREALLOCATION_LIMIT: u64 = 64 * 1024 * 1024;

pub struct ZipFormat;

impl ArchiveFormat for ZipFormat {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn open(&self, data: Vec<u8>) -> Result<Arc<dyn ArchiveReader>> {
        Ok(Arc::new(ZipReader::from_bytes(data)?))
    }

    fn create(&self) -> Box<dyn ArchiveWriter> {
        Box::new(ZipContainerWriter::new())
    }
}

/// Every member is inflated up front; the container is opened exactly once
/// and enumeration never touches the zip structures again.
pub struct ZipReader {
    members: Vec<(String, Vec<u8>)>,
    closed: AtomicBool,
}

impl ZipReader {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data)).or_raise(|| ErrorKind::MalformedContainer)?;
        let mut members = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive.by_index(index).or_raise(|| ErrorKind::MalformedContainer)?;
            let mut bytes = Vec::with_capacity(usize::try_from(file.size().min(PREALLOCATION_LIMIT)).unwrap_or_default());
            file.read_to_end(&mut bytes).or_raise(|| ErrorKind::MalformedContainer)?;
            members.push((file.name().to_string(), bytes));
        }
        tracing::trace!(members = members.len(), "Opened zip container");
        Ok(Self { members, closed: AtomicBool::new(false) })
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            exn::bail!(ErrorKind::ReaderClosed);
        }
        Ok(())
    }
}

impl ArchiveReader for ZipReader {
    fn names(&self) -> Result<Vec<String>> {
        self.check_open()?;
        Ok(self.members.iter().map(|(name, _)| name.clone()).collect())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.check_open()?;
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| exn::Exn::from(ErrorKind::EntryNotFound(name.to_string())))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

pub struct ZipContainerWriter {
    inner: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
}

impl ZipContainerWriter {
    fn new() -> Self {
        Self { inner: ZipWriter::new(Cursor::new(Vec::new())), names: HashSet::new() }
    }

    fn options() -> FileOptions {
        FileOptions::default().compression_method(CompressionMethod::Deflated)
    }

    fn claim(&mut self, name: &str) -> bool {
        if self.names.insert(name.to_string()) {
            return true;
        }
        tracing::warn!(entry = name, "Skipping duplicate entry name");
        false
    }
}

impl ArchiveWriter for ZipContainerWriter {
    fn add_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        if !self.claim(name) {
            return Ok(());
        }
        self.inner.start_file(name, Self::options()).or_raise(|| ErrorKind::Io)?;
        self.inner.write_all(data).or_raise(|| ErrorKind::Io)?;
        Ok(())
    }

    fn add_directory(&mut self, name: &str) -> Result<()> {
        if !self.claim(name) {
            return Ok(());
        }
        self.inner.add_directory(name, Self::options()).or_raise(|| ErrorKind::Io)?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<u8>> {
        Ok(self.inner.finish().or_raise(|| ErrorKind::Io)?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipFormat.create();
        for (name, data) in files {
            if name.ends_with('/') {
                writer.add_directory(name).unwrap();
            } else {
                writer.add_file(name, data.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap()
    }

    #[test]
    fn written_containers_can_be_read() {
        let data = container(&[("Saga/", ""), ("Saga/p1.jpg", "one"), ("ComicInfo.xml", "<ComicInfo/>")]);
        let reader = ZipFormat.open(data).unwrap();
        assert_eq!(reader.names().unwrap(), vec!["Saga/", "Saga/p1.jpg", "ComicInfo.xml"]);
        assert_eq!(reader.read("Saga/p1.jpg").unwrap(), b"one");
        let err = reader.read("p2.jpg").unwrap_err();
        assert_eq!(*err, ErrorKind::EntryNotFound("p2.jpg".to_string()));
    }

    #[test]
    fn duplicate_names_are_skipped() {
        let data = container(&[("p1.jpg", "first"), ("p1.jpg", "second")]);
        let reader = ZipFormat.open(data).unwrap();
        assert_eq!(reader.names().unwrap(), vec!["p1.jpg"]);
        assert_eq!(reader.read("p1.jpg").unwrap(), b"first");
    }

    #[test]
    fn closed_reader_refuses_access() {
        let reader = ZipFormat.open(container(&[("p1.jpg", "x")])).unwrap();
        reader.close();
        assert!(reader.is_closed());
        assert_eq!(*reader.names().unwrap_err(), ErrorKind::ReaderClosed);
    }

    #[test]
    fn declared_member_size_is_not_trusted() {
        let mut data = container(&[("p1.jpg", "one")]);
        let header = data.windows(4).position(|w| w == [0x50, 0x4b, 0x01, 0x02]).unwrap();
        data[header + 24..header + 28].copy_from_slice(&0xffff_fff0u32.to_le_bytes());
        let reader = ZipFormat.open(data).unwrap();
        assert_eq!(reader.read("p1.jpg").unwrap(), b"one");
    }

    #[test]
    fn garbage_is_malformed() {
        let err = ZipFormat.open(b"definitely not a zip".to_vec()).err().unwrap();
        assert_eq!(*err, ErrorKind::MalformedContainer);
    }
}
