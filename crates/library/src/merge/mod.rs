//! Merging several archives into one.
//!
//! [`plan_merge`] decides, from entry lists alone, which entries survive and
//! what they are called so that no two collide. [`merge`] applies a plan by
//! streaming every source's entries into a single new container, in source
//! order, and writing it once at the end.

mod plan;

use std::path::{Path, PathBuf};

use exn::ResultExt;
use tankobon_archive::error::ErrorKind as ArchiveErrorKind;
use tankobon_archive::{CancellationToken, Context};
use tracing::instrument;

pub use self::plan::{MergePlan, MergeRename, MergeSource, plan_merge};
use crate::error::{ErrorKind, Result};

/// Merge `sources` into `destination`, returning the applied plan.
///
/// The destination may be one of the sources: every read happens before the
/// merged container is written.
#[instrument(skip(ctx, sources, cancel), fields(destination = %destination.display(), sources = sources.len()))]
pub async fn merge(
    ctx: &Context,
    sources: &[PathBuf],
    destination: &Path,
    cancel: CancellationToken,
) -> Result<MergePlan> {
    let mut listed = Vec::with_capacity(sources.len());
    for path in sources {
        let mut archive = ctx.open(path).with_cancellation(cancel.clone());
        listed.push((path.clone(), archive.entries().await.or_raise(|| ErrorKind::Archive)?));
    }
    let plan = plan_merge(&listed)?;

    let mut writer = ctx.create_writer(destination).or_raise(|| ErrorKind::Archive)?;
    for source in &plan.sources {
        let mut archive = ctx.open(&source.path).with_cancellation(cancel.clone());
        for rename in &source.renames {
            let data = archive.read_entry(&rename.from).await.or_raise(|| ErrorKind::Archive)?;
            writer.add_file(&rename.to, &data).or_raise(|| ErrorKind::Archive)?;
        }
    }
    if cancel.is_cancelled() {
        return Err(exn::Exn::from(ArchiveErrorKind::RequestAborted)).or_raise(|| ErrorKind::Archive);
    }
    ctx.commit(destination, writer).await.or_raise(|| ErrorKind::Archive)?;
    tracing::info!(entries = plan.len(), "Merged archives");
    Ok(plan)
}
