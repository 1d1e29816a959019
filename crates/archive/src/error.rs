//! Archive Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Errors from the storage, metadata and imaging crates are
//! raised into one of the kinds below so callers only match on one enum.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No container format is registered for the file extension.
    #[display("unsupported format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The request was cancelled before the operation started (or before it
    /// committed anything).
    #[display("request aborted")]
    RequestAborted,
    /// The archive does not exist.
    #[display("archive not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The path escapes the storage root.
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The container could not be opened or is corrupt.
    #[display("malformed container")]
    MalformedContainer,
    /// The named entry is not in the archive.
    #[display("entry not found: {_0}")]
    EntryNotFound(#[error(not(source))] String),
    /// The reader was closed (usually evicted from the cache) while in use.
    #[display("archive reader is closed")]
    ReaderClosed,
    /// Reading or writing the underlying file failed.
    #[display("storage error")]
    Storage,
    /// The embedded ComicInfo document could not be read or written.
    #[display("metadata error")]
    Metadata,
    /// A page image could not be decoded, composited or encoded.
    #[display("image error")]
    Image,
    /// Writing the new container failed.
    #[display("I/O error while writing container")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::ReaderClosed)
    }

    /// Returns `true` for cancellation, which callers should not report as a
    /// fault.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::RequestAborted)
    }
}
