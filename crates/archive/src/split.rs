//! Splitting one archive into several.

use crate::archive::{Archive, copy_entry};
use crate::entry::Entry;
use crate::error::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::instrument;

/// One output of [`Archive::split`]: a destination file and the image
/// entries it receives, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    pub destination: PathBuf,
    pub entries: Vec<String>,
}

impl SplitPlan {
    pub fn new(destination: impl Into<PathBuf>, entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { destination: destination.into(), entries: entries.into_iter().map(Into::into).collect() }
    }
}

impl Archive {
    /// Write each plan to its own container.
    ///
    /// The first plan also receives every non-image entry, so metadata is
    /// never duplicated. Names that aren't images in this archive are
    /// skipped. Every destination format is checked before anything is
    /// written; each destination is then replaced in one write.
    #[instrument(skip(self, plans), fields(path = %self.path().display(), plans = plans.len()))]
    pub async fn split(&mut self, plans: &[SplitPlan]) -> Result<()> {
        let (reader, entries) = self.snapshot().await?;
        let formats = plans
            .iter()
            .map(|plan| self.ctx.formats.for_path(&plan.destination))
            .collect::<Result<Vec<_>>>()?;

        let (images, others): (Vec<&Entry>, Vec<&Entry>) = entries.iter().partition(|entry| entry.is_image);
        let images: HashMap<&str, &Entry> = images.into_iter().map(|entry| (entry.name.as_str(), entry)).collect();

        let own_key = self.ctx.cache_key(self.path())?;
        let mut rewrote_self = false;
        for (index, (plan, format)) in plans.iter().zip(formats).enumerate() {
            let mut writer = format.create();
            if index == 0 {
                for entry in &others {
                    self.checkpoint()?;
                    copy_entry(reader.as_ref(), writer.as_mut(), entry, &entry.name)?;
                }
            }
            for name in &plan.entries {
                self.checkpoint()?;
                match images.get(name.as_str()) {
                    Some(entry) => copy_entry(reader.as_ref(), writer.as_mut(), entry, name)?,
                    None => tracing::debug!(entry = %name, "Skipping missing image"),
                }
            }
            self.write_container(&plan.destination, writer).await?;
            rewrote_self |= self.ctx.cache_key(&plan.destination)? == own_key;
        }

        // The source reader stays open until every destination is written.
        for plan in plans {
            self.ctx.invalidate(&plan.destination).await?;
        }
        if rewrote_self {
            self.mark_dirty();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{fixture, names};
    use std::path::Path;
    use tankobon_storage::backend::StorageBackend;

    #[tokio::test]
    async fn partitions_images_and_keeps_extras_in_first() {
        let xml = b"<ComicInfo/>";
        let (backend, ctx) =
            fixture(&[("p1.jpg", b"1"), ("p2.jpg", b"2"), ("p3.jpg", b"3"), ("ComicInfo.xml", xml), ("d/", b"")]);
        let mut archive = ctx.open("Saga 001.cbz");
        let plans = [
            SplitPlan::new("Saga 001a.cbz", ["p1.jpg", "missing.jpg"]),
            SplitPlan::new("Saga 001b.cbz", ["p3.jpg", "p2.jpg"]),
        ];
        archive.split(&plans).await.unwrap();

        let mut first = ctx.open("Saga 001a.cbz");
        assert_eq!(names(&first.entries().await.unwrap()), vec!["ComicInfo.xml", "d/", "p1.jpg"]);
        let mut second = ctx.open("Saga 001b.cbz");
        assert_eq!(names(&second.entries().await.unwrap()), vec!["p2.jpg", "p3.jpg"]);
        assert_eq!(second.read_entry("p3.jpg").await.unwrap(), b"3");

        // The source is untouched.
        assert!(!archive.is_dirty());
        assert!(backend.exists(Path::new("Saga 001.cbz")).await.unwrap());
        assert_eq!(archive.entries().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn unsupported_destination_writes_nothing() {
        let (backend, ctx) = fixture(&[("p1.jpg", b"1")]);
        let mut archive = ctx.open("Saga 001.cbz");
        let plans = [SplitPlan::new("ok.cbz", ["p1.jpg"]), SplitPlan::new("bad.cbr", ["p1.jpg"])];
        let err = archive.split(&plans).await.unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(".cbr".to_string()));
        assert!(!backend.exists(Path::new("ok.cbz")).await.unwrap());
    }

    #[tokio::test]
    async fn splitting_into_itself_marks_dirty() {
        let (_, ctx) = fixture(&[("p1.jpg", b"1"), ("p2.jpg", b"2")]);
        let mut archive = ctx.open("Saga 001.cbz");
        let plans = [SplitPlan::new("Saga 001.cbz", ["p1.jpg"]), SplitPlan::new("Saga 002.cbz", ["p2.jpg"])];
        archive.split(&plans).await.unwrap();
        assert!(archive.is_dirty());
        assert_eq!(names(&archive.entries().await.unwrap()), vec!["p1.jpg"]);
    }
}
