//! Path validation.
//!
//! Archive paths come from callers (the CLI, or whatever HTTP layer sits in
//! front of the engine) and must be resolved against the storage root without
//! ever leaving it.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a storage path.
///
/// `.` segments, duplicate separators and a leading root are dropped, `..`
/// segments are resolved lexically. A path that would climb above the storage
/// root, resolves to nothing, or contains a null byte is rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tankobon_storage::validate_path;
/// assert!(validate_path("Saga/Saga 001.cbz").is_ok());
/// assert!(validate_path("Saga/../Saga 002.cbz").is_ok());
/// assert!(validate_path("../outside.cbz").is_err());
/// assert!(validate_path("a\0b.cbz").is_err());
/// assert_eq!(
///     validate_path("/library/./Saga//vol1/../Saga 003.cbz").unwrap(),
///     Path::new("library/Saga/Saga 003.cbz")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Null bytes survive Path::components() on Unix but truncate
                // paths in C-based syscalls.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        assert_eq!(validate("Saga/Saga 001.cbz").unwrap(), Path::new("Saga/Saga 001.cbz"));
        assert_eq!(validate("single.cbz").unwrap(), Path::new("single.cbz"));
    }

    #[test]
    fn test_absolute_paths_become_relative() {
        assert_eq!(validate("/srv/comics/a.cbz").unwrap(), Path::new("srv/comics/a.cbz"));
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(validate("a//b//c.cbz").unwrap(), Path::new("a/b/c.cbz"));
        assert_eq!(validate("a/./b/./c.cbz").unwrap(), Path::new("a/b/c.cbz"));
        assert_eq!(validate("a/b/..").unwrap(), Path::new("a"));
        assert_eq!(validate("Saga///").unwrap(), Path::new("Saga"));
    }

    #[test]
    fn test_traversal_attempts() {
        assert!(validate("../etc/passwd").is_err());
        assert!(validate("a/../../b.cbz").is_err());
        assert!(validate("..").is_err());
    }

    #[test]
    fn test_invalid_characters() {
        assert!(validate("a\0b.cbz").is_err());
        assert!(validate("\0").is_err());
    }

    #[test]
    fn test_empty_paths() {
        assert!(validate("").is_err());
        assert!(validate(".").is_err());
        assert!(validate("./.").is_err());
        assert!(validate("//").is_err());
    }
}
