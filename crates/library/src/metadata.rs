//! Metadata edits built on top of [`Archive::set_metadata`].

use exn::ResultExt;
use tankobon_archive::Archive;
use tankobon_comicinfo::{ComicInfo, Page, PageType};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Overlay the fields set in `patch` on the stored record and write it back.
/// Returns the record as written.
#[instrument(skip(archive, patch), fields(path = %archive.path().display()))]
pub async fn patch_metadata(archive: &mut Archive, patch: &ComicInfo) -> Result<ComicInfo> {
    let mut info = archive.metadata().await.or_raise(|| ErrorKind::Metadata)?;
    info.apply(patch);
    archive.set_metadata(&info).await.or_raise(|| ErrorKind::Archive)?;
    Ok(info)
}

/// Rebuild the page list from the archive's images and set `PageCount`.
///
/// Pages are indexed in canonical entry order. The cover image becomes
/// `FrontCover`; other pages keep a role they already had, `Story` if none.
/// Attributes already recorded for an index are kept.
#[instrument(skip(archive), fields(path = %archive.path().display()))]
pub async fn sync_pages(archive: &mut Archive) -> Result<ComicInfo> {
    let mut info = archive.metadata().await.or_raise(|| ErrorKind::Metadata)?;
    let entries = archive.entries().await.or_raise(|| ErrorKind::Archive)?;
    let cover = archive.cover().await.or_raise(|| ErrorKind::Archive)?.map(|image| image.name);

    let pages: Vec<Page> = entries
        .iter()
        .filter(|entry| entry.is_image)
        .enumerate()
        .map(|(index, entry)| {
            let index = i32::try_from(index).unwrap_or(i32::MAX);
            let existing = info.pages.iter().find(|page| page.image == Some(index));
            let mut page = existing.cloned().unwrap_or_else(|| Page::new(index, PageType::Story));
            page.page_type = Some(match page.page_type {
                _ if cover.as_deref() == Some(entry.name.as_str()) => PageType::FrontCover,
                Some(PageType::FrontCover) | None => PageType::Story,
                Some(other) => other,
            });
            page
        })
        .collect();

    tracing::debug!(pages = pages.len(), "Synchronised page list");
    info.page_count = Some(i32::try_from(pages.len()).unwrap_or(i32::MAX));
    info.pages = pages;
    archive.set_metadata(&info).await.or_raise(|| ErrorKind::Archive)?;
    Ok(info)
}
