//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An archive operation failed; the cause is the child error.
    #[display("archive operation failed")]
    Archive,
    /// More than a thousand entries competed for the same name while merging.
    #[display("too many same-named entries: {_0}")]
    MergeCollisionExhausted(#[error(not(source))] String),
    /// Renumbering an entry would take it past the largest page number.
    #[display("page number out of range: {_0}")]
    NumberOverflow(#[error(not(source))] String),
    /// A rename rule is not of the form `/pattern/flags` or
    /// `/pattern/replacement/flags`.
    #[display("invalid rename rule: {_0}")]
    InvalidRule(#[error(not(source))] String),
    /// The metadata patch could not be applied.
    #[display("metadata error")]
    Metadata,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Planning is deterministic; archive failures are reported as-is.
        false
    }
}
