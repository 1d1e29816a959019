//! Storage access for comic archives.
//!
//! Everything the archive engine needs from a filesystem goes through the
//! [`StorageBackend`] trait: `stat`, full reads, atomic full writes, deletes
//! and renames. Paths handed to a backend are relative to its root and are
//! validated with [`validate_path`] so they can never escape it.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
