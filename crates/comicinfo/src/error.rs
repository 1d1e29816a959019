//! Metadata Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A metadata error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document is not well-formed XML.
    #[display("malformed XML")]
    MalformedXml,
    /// The document has no top-level `ComicInfo` element.
    #[display("missing ComicInfo root element")]
    MissingRoot,
    /// Writing the XML document failed.
    #[display("failed to encode ComicInfo document")]
    Encode,
    /// A field name does not exist in the schema.
    #[display("unknown field: {_0}")]
    UnknownField(#[error(not(source))] String),
    /// A field was found but its value could not be parsed.
    #[display("failed to parse field '{field}', found value: {value}")]
    ParseError {
        /// The field that failed to parse.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The document is either valid or it's not.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::MalformedXml.to_string(), "malformed XML");
        assert_eq!(
            ErrorKind::ParseError { field: "year", value: "soon".to_string() }.to_string(),
            "failed to parse field 'year', found value: soon"
        );
        assert_eq!(ErrorKind::UnknownField("colour".to_string()).to_string(), "unknown field: colour");
    }
}
