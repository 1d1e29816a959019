//! Decoding and per-format encoding.

use exn::ResultExt;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use crate::RasterFormat;
use crate::error::{ErrorKind, Result};

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Encoder settings shared by every re-encoding path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// JPEG quality, 1 to 100.
    pub jpeg_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { jpeg_quality: DEFAULT_JPEG_QUALITY }
    }
}

/// Decode `data`, trusting `format` rather than sniffing the content.
pub fn decode(data: &[u8], format: RasterFormat) -> Result<DynamicImage> {
    image::load_from_memory_with_format(data, format.image_format()).or_raise(|| ErrorKind::Decode)
}

/// Encode `image` as `format`.
///
/// JPEG has no alpha channel, so transparent pixels are flattened to their
/// colour channels. WebP is written losslessly.
pub fn encode(image: &DynamicImage, format: RasterFormat, options: &EncodeOptions) -> Result<Vec<u8>> {
    let (width, height) = (image.width(), image.height());
    let mut buf = Vec::new();
    match format {
        RasterFormat::Jpeg => {
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, options.jpeg_quality.clamp(1, 100))
                .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
                .or_raise(|| ErrorKind::Encode)?;
        },
        RasterFormat::Png => {
            let rgba = image.to_rgba8();
            PngEncoder::new(&mut buf)
                .write_image(&rgba, width, height, ExtendedColorType::Rgba8)
                .or_raise(|| ErrorKind::Encode)?;
        },
        RasterFormat::WebP => {
            let rgba = image.to_rgba8();
            WebPEncoder::new_lossless(&mut buf)
                .write_image(&rgba, width, height, ExtendedColorType::Rgba8)
                .or_raise(|| ErrorKind::Encode)?;
        },
    }
    Ok(buf)
}
