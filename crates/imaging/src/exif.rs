//! EXIF stripping.
//!
//! The archive facade only needs "bytes in, bytes out" for each image entry.
//! [`Reencoder`] satisfies that by decoding and re-encoding the pixels, which
//! drops every metadata block the encoder doesn't write itself.

use async_trait::async_trait;
use exn::ResultExt;

use crate::codec::{EncodeOptions, decode, encode};
use crate::error::{ErrorKind, Result};
use crate::format::RasterFormat;

/// Removes embedded metadata from an image.
#[async_trait]
pub trait ExifStripper: Send + Sync {
    /// Return `data` without EXIF metadata. `mime` is the entry's MIME type
    /// as derived from its extension.
    async fn strip(&self, data: Vec<u8>, mime: &str) -> Result<Vec<u8>>;
}

/// Strips metadata by decoding and re-encoding in the same format.
///
/// Formats without an encoder are returned untouched.
#[derive(Debug, Clone, Default)]
pub struct Reencoder {
    options: EncodeOptions,
}

impl Reencoder {
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ExifStripper for Reencoder {
    async fn strip(&self, data: Vec<u8>, mime: &str) -> Result<Vec<u8>> {
        let Some(format) = RasterFormat::from_mime(mime) else {
            tracing::debug!(mime, "No encoder for format, leaving image untouched");
            return Ok(data);
        };
        let options = self.options;
        tokio::task::spawn_blocking(move || encode(&decode(&data, format)?, format, &options))
            .await
            .or_raise(|| ErrorKind::Task)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

    #[tokio::test]
    async fn reencodes_supported_formats() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));
        let png = encode(&image, RasterFormat::Png, &EncodeOptions::default()).unwrap();
        let stripped = Reencoder::default().strip(png, "image/png").await.unwrap();
        assert_eq!(decode(&stripped, RasterFormat::Png).unwrap().dimensions(), (4, 4));
    }

    #[tokio::test]
    async fn passes_through_unknown_formats() {
        let data = b"GIF89a....".to_vec();
        let stripped = Reencoder::default().strip(data.clone(), "image/gif").await.unwrap();
        assert_eq!(stripped, data);
    }

    #[tokio::test]
    async fn fails_on_corrupt_image() {
        let err = Reencoder::default().strip(b"nope".to_vec(), "image/jpeg").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Decode);
    }
}
