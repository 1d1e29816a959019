//! Imaging Error Types

use derive_more::{Display, Error};

/// An imaging error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for imaging operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No codec is available for this extension or MIME type.
    #[display("unsupported image format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The bytes are not a valid image of the expected format.
    #[display("failed to decode image")]
    Decode,
    /// The encoder rejected the image.
    #[display("failed to encode image")]
    Encode,
    /// The composed image would exceed the dimensions an image can hold.
    #[display("image too large: {_0}x{_1}")]
    TooLarge(#[error(not(source))] u64, #[error(not(source))] u64),
    /// The colour is not a hex colour.
    #[display("invalid colour: {_0}")]
    InvalidColor(#[error(not(source))] String),
    /// A blocking worker task panicked or was cancelled.
    #[display("image task did not complete")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Task)
    }
}
