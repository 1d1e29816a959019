//! Planning over comic archives.
//!
//! The archive crate edits one container at a time; this crate decides what
//! those edits should be. [`rename`] rewrites entry names with regex rules and
//! page-number normalisation, [`merge`] renumbers entries from several
//! archives so they can share one container, and [`metadata`] patches the
//! embedded record.

pub mod error;
pub mod merge;
pub mod metadata;
mod number;
pub mod rename;
mod rules;
#[cfg(test)]
mod testing;

pub use crate::merge::{MergePlan, MergeRename, MergeSource, merge, plan_merge};
pub use crate::metadata::{patch_metadata, sync_pages};
pub use crate::number::Number;
pub use crate::rename::{RenameOptions, plan_renames, rename_map};
pub use crate::rules::{Rule, parse_rules};
