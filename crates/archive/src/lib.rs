//! Comic archive facade.
//!
//! Open archives through a [`Context`], which bundles the storage backend,
//! the shared reader cache, the registered container formats and the image
//! collaborators:
//!
//! ```no_run
//! use std::sync::Arc;
//! use tankobon_archive::Context;
//! use tankobon_storage::backend::LocalBackend;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(LocalBackend::new("local", "/srv/comics")?);
//! let ctx = Context::new(backend);
//! let mut archive = ctx.open("Saga/Saga 001.cbz");
//! for entry in archive.entries().await? {
//!     println!("{}", entry.name);
//! }
//! # Ok(())
//! # }
//! ```

mod archive;
mod cache;
mod context;
mod entry;
pub mod error;
pub mod format;
mod join;
mod split;
#[cfg(test)]
mod testing;

pub use crate::archive::{Archive, Image, Rename};
pub use crate::cache::{ArchiveCache, CacheKey};
pub use crate::context::Context;
pub use crate::entry::{Entry, mime_for_extension, natural_cmp, sort_canonical};
pub use crate::join::JoinPair;
pub use crate::split::SplitPlan;
pub use tokio_util::sync::CancellationToken;
