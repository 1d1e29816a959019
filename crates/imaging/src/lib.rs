//! Page image handling.
//!
//! Everything here works on whole in-memory images: archives are small enough
//! that pages are decoded, composited and re-encoded without streaming.

mod codec;
mod color;
mod compose;
pub mod error;
mod exif;
mod format;

pub use crate::codec::{DEFAULT_JPEG_QUALITY, EncodeOptions, decode, encode};
pub use crate::color::Color;
pub use crate::compose::{MAX_CANVAS_PIXELS, compose_horizontal, join_pages};
pub use crate::exif::{ExifStripper, Reencoder};
pub use crate::format::RasterFormat;
