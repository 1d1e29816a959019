use image::{DynamicImage, RgbaImage, imageops};

use crate::Color;
use crate::codec::{EncodeOptions, decode, encode};
use crate::error::{ErrorKind, Result};
use crate::format::RasterFormat;
use exn::ResultExt;

/// Place `left` and `right` side by side with a `gap` pixel wide block of
/// `color` between them.
///
/// Both images are top-aligned; when their heights differ, the space under
/// the shorter one is filled with `color` as well.
///
/// Fails with [`ErrorKind::TooLarge`] when the canvas would be wider than
/// `u32::MAX` or hold more than [`MAX_CANVAS_PIXELS`] pixels.
pub fn compose_horizontal(left: &DynamicImage, right: &DynamicImage, gap: u32, color: Color) -> Result<RgbaImage> {
    let height = left.height().max(right.height());
    let total = u64::from(left.width()) + u64::from(gap) + u64::from(right.width());
    let Some(width) = u32::try_from(total).ok().filter(|width| u64::from(*width) * u64::from(height) <= MAX_CANVAS_PIXELS)
    else {
        exn::bail!(ErrorKind::TooLarge(total, u64::from(height)));
    };
    let mut canvas = RgbaImage::from_pixel(width, height, color.0);
    imageops::replace(&mut canvas, &left.to_rgba8(), 0, 0);
    imageops::replace(&mut canvas, &right.to_rgba8(), i64::from(left.width()) + i64::from(gap), 0);
    Ok(canvas)
}

/// Largest canvas, in pixels, that [`compose_horizontal`] will allocate.
pub const MAX_CANVAS_PIXELS: u64 = 1 << 30;

/// Decode two pages of the same format, join them and re-encode the result in
/// that format. Runs on the blocking pool.
pub async fn join_pages(
    left: Vec<u8>,
    right: Vec<u8>,
    format: RasterFormat,
    gap: u32,
    color: Color,
    options: EncodeOptions,
) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || {
        let left = decode(&left, format)?;
        let right = decode(&right, format)?;
        let joined = DynamicImage::ImageRgba8(compose_horizontal(&left, &right, gap, color)?);
        encode(&joined, format, &options)
    })
    .await
    .or_raise(|| ErrorKind::Task)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba};

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }

    #[test]
    fn composes_left_gap_right() {
        let left = solid(2, 3, [255, 0, 0, 255]);
        let right = solid(4, 3, [0, 0, 255, 255]);
        let canvas = compose_horizontal(&left, &right, 1, Color(Rgba([0, 255, 0, 255]))).unwrap();
        assert_eq!(canvas.dimensions(), (7, 3));
        assert_eq!(canvas.get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(2, 1), &Rgba([0, 255, 0, 255]));
        assert_eq!(canvas.get_pixel(3, 2), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn shorter_page_is_padded_with_gap_colour() {
        let left = solid(2, 4, [255, 0, 0, 255]);
        let right = solid(2, 2, [0, 0, 255, 255]);
        let canvas = compose_horizontal(&left, &right, 0, Color::WHITE).unwrap();
        assert_eq!(canvas.dimensions(), (4, 4));
        assert_eq!(canvas.get_pixel(3, 1), &Rgba([0, 0, 255, 255]));
        assert_eq!(canvas.get_pixel(3, 3), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn oversized_gap_is_rejected() {
        let page = solid(1, 1, [0, 0, 0, 255]);
        let err = compose_horizontal(&page, &page, u32::MAX, Color::WHITE).unwrap_err();
        assert_eq!(*err, ErrorKind::TooLarge(u64::from(u32::MAX) + 2, 1));
    }

    #[test]
    fn canvas_area_is_bounded() {
        let tall = solid(1, 2, [0, 0, 0, 255]);
        let err = compose_horizontal(&tall, &tall, 1 << 30, Color::WHITE).unwrap_err();
        assert_eq!(*err, ErrorKind::TooLarge((1 << 30) + 2, 2));
    }

    #[tokio::test]
    async fn oversized_join_fails_instead_of_panicking() {
        let options = EncodeOptions::default();
        let page = encode(&solid(1, 1, [1, 2, 3, 255]), RasterFormat::Png, &options).unwrap();
        let err = join_pages(page.clone(), page, RasterFormat::Png, u32::MAX, Color::WHITE, options).await.unwrap_err();
        assert!(matches!(*err, ErrorKind::TooLarge(..)));
    }

    #[tokio::test]
    async fn join_pages_round_trips_through_png() {
        let options = EncodeOptions::default();
        let left = encode(&solid(3, 2, [1, 2, 3, 255]), RasterFormat::Png, &options).unwrap();
        let right = encode(&solid(5, 2, [4, 5, 6, 255]), RasterFormat::Png, &options).unwrap();
        let joined = join_pages(left, right, RasterFormat::Png, 2, Color::WHITE, options).await.unwrap();
        let image = decode(&joined, RasterFormat::Png).unwrap();
        assert_eq!(image.dimensions(), (10, 2));
        assert_eq!(image.get_pixel(4, 0), Rgba([255, 255, 255, 255]));
    }
}
