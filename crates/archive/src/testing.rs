//! Fixtures shared by the facade tests.

use crate::context::Context;
use crate::entry::Entry;
use crate::format::{ArchiveFormat, ZipFormat};
use image::{DynamicImage, Rgba, RgbaImage};
use std::sync::Arc;
use tankobon_imaging::{EncodeOptions, RasterFormat, encode};
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

pub(crate) fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    raster(width, height, rgba, RasterFormat::Png)
}

pub(crate) fn raster(width: u32, height: u32, rgba: [u8; 4], format: RasterFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)));
    encode(&image, format, &EncodeOptions::default()).unwrap()
}

pub(crate) fn names(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.name.as_str()).collect()
}
