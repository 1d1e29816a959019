//! Joining page pairs into spreads.

use crate::archive::Archive;
use crate::entry::Entry;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::collections::{BTreeMap, HashMap};
use tankobon_imaging::{Color, RasterFormat, join_pages};
use tracing::instrument;

/// Two entries to be placed side by side, `left` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPair {
    pub left: String,
    pub right: String,
}

impl JoinPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self { left: left.into(), right: right.into() }
    }

    /// Shared raster format of both sides, if they have one.
    fn format(&self) -> Option<RasterFormat> {
        let (left, right) = (Entry::new(self.left.as_str()), Entry::new(self.right.as_str()));
        if !left.ext.eq_ignore_ascii_case(&right.ext) {
            return None;
        }
        RasterFormat::from_extension(&left.ext)
    }

    /// `<right>-<left><ext>`, using base names only.
    fn joined_name(&self) -> String {
        let (left, right) = (Entry::new(self.left.as_str()), Entry::new(self.right.as_str()));
        format!("{}-{}{}", right.base_name, left.base_name, left.ext)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

#[derive(Default)]
struct Halves {
    left: Option<Vec<u8>>,
    right: Option<Vec<u8>>,
}

impl Archive {
    /// Composite each pair into a single image, `gap` pixels apart on a
    /// `color` background.
    ///
    /// Pairs whose sides have different extensions, or an extension with no
    /// encoder, are ignored. An entry already claimed by an earlier pair is
    /// not joined again. A side whose partner is missing from the archive is
    /// kept under its own name; every other entry passes through.
    #[instrument(skip(self, pairs), fields(path = %self.path().display(), pairs = pairs.len()))]
    pub async fn combine_images(&mut self, pairs: &[JoinPair], gap: u32, color: Color) -> Result<()> {
        let (reader, entries) = self.snapshot().await?;

        let mut claims: HashMap<&str, (usize, Side, RasterFormat)> = HashMap::new();
        for (index, pair) in pairs.iter().enumerate() {
            let Some(format) = pair.format() else {
                tracing::debug!(left = %pair.left, right = %pair.right, "Dropping pair with mismatched or unsupported formats");
                continue;
            };
            if pair.left == pair.right
                || claims.contains_key(pair.left.as_str())
                || claims.contains_key(pair.right.as_str())
            {
                tracing::debug!(left = %pair.left, right = %pair.right, "Dropping pair reusing an entry");
                continue;
            }
            claims.insert(&pair.left, (index, Side::Left, format));
            claims.insert(&pair.right, (index, Side::Right, format));
        }

        let mut pending: BTreeMap<usize, Halves> = BTreeMap::new();
        let mut writer = self.create_writer()?;
        for entry in &entries {
            self.checkpoint()?;
            if entry.is_directory {
                writer.add_directory(&entry.name)?;
                continue;
            }
            let data = reader.read(&entry.name)?;
            let Some(&(index, side, format)) = claims.get(entry.name.as_str()) else {
                writer.add_file(&entry.name, &data)?;
                continue;
            };
            let halves = pending.entry(index).or_default();
            match side {
                Side::Left => halves.left = Some(data),
                Side::Right => halves.right = Some(data),
            }
            if !is_complete(halves) {
                continue;
            }
            if let Some(Halves { left: Some(left), right: Some(right) }) = pending.remove(&index) {
                let pair = &pairs[index];
                let joined = join_pages(left, right, format, gap, color, self.ctx.encode)
                    .await
                    .or_raise(|| ErrorKind::Image)?;
                tracing::debug!(left = %pair.left, right = %pair.right, "Joined pages");
                writer.add_file(&pair.joined_name(), &joined)?;
            }
        }

        for (index, halves) in pending {
            let pair = &pairs[index];
            tracing::debug!(left = %pair.left, right = %pair.right, "Pair incomplete, keeping the side that exists");
            if let Some(left) = halves.left {
                writer.add_file(&pair.left, &left)?;
            }
            if let Some(right) = halves.right {
                writer.add_file(&pair.right, &right)?;
            }
        }
        self.commit(writer).await
    }
}

fn is_complete(halves: &Halves) -> bool {
    halves.left.is_some() && halves.right.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, names, png, raster};
    use image::GenericImageView;

    #[tokio::test]
    async fn joins_valid_pairs() {
        let left = png(2, 3, [255, 0, 0, 255]);
        let right = png(4, 3, [0, 0, 255, 255]);
        let (_, ctx) = fixture(&[("p01.png", &left), ("p02.png", &right), ("p03.png", &left)]);
        let mut archive = ctx.open("Saga 001.cbz");
        let black: Color = "#000".parse().unwrap();
        archive.combine_images(&[JoinPair::new("p01.png", "p02.png")], 1, black).await.unwrap();

        assert_eq!(names(&archive.entries().await.unwrap()), vec!["p02-p01.png", "p03.png"]);
        let joined = archive.image("p02-p01.png").await.unwrap().unwrap();
        let image = image::load_from_memory(&joined.data).unwrap();
        assert_eq!(image.dimensions(), (7, 3));
        assert_eq!(image.get_pixel(2, 0), image::Rgba([0, 0, 0, 255]));
    }

    #[tokio::test]
    async fn mismatched_extensions_are_left_alone() {
        let (_, ctx) = fixture(&[("x.png", &png(1, 1, [0, 0, 0, 255])), ("y.jpg", b"jpeg")]);
        let mut archive = ctx.open("Saga 001.cbz");
        archive.combine_images(&[JoinPair::new("x.png", "y.jpg")], 0, Color::WHITE).await.unwrap();
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["x.png", "y.jpg"]);
    }

    #[tokio::test]
    async fn unsupported_raster_types_are_left_alone() {
        let (_, ctx) = fixture(&[("a.gif", b"GIF89a"), ("b.gif", b"GIF89a")]);
        let mut archive = ctx.open("Saga 001.cbz");
        archive.combine_images(&[JoinPair::new("a.gif", "b.gif")], 0, Color::WHITE).await.unwrap();
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["a.gif", "b.gif"]);
    }

    #[tokio::test]
    async fn incomplete_pairs_keep_the_existing_side() {
        let (_, ctx) = fixture(&[("p1.png", &png(1, 1, [0, 0, 0, 255])), ("p3.png", b"3")]);
        let mut archive = ctx.open("Saga 001.cbz");
        archive.combine_images(&[JoinPair::new("p1.png", "p2.png")], 0, Color::WHITE).await.unwrap();
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["p1.png", "p3.png"]);
    }

    #[tokio::test]
    async fn entries_are_only_joined_once() {
        let page = raster(1, 1, [0, 0, 0, 255], RasterFormat::Jpeg);
        let (_, ctx) = fixture(&[("a.jpg", &page), ("b.jpg", &page), ("c.jpg", &page)]);
        let mut archive = ctx.open("Saga 001.cbz");
        let pairs = [JoinPair::new("a.jpg", "b.jpg"), JoinPair::new("b.jpg", "c.jpg")];
        archive.combine_images(&pairs, 0, Color::WHITE).await.unwrap();
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["b-a.jpg", "c.jpg"]);
    }
}
