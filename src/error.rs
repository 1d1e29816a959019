//! CLI Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for commands.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("could not open the archive root")]
    Storage,
    #[display("archive operation failed")]
    Archive,
    #[display("planning failed")]
    Library,
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] String),
    #[display("no such image: {_0}")]
    NoImage(#[error(not(source))] String),
    #[display("could not write {}", _0.display())]
    Output(#[error(not(source))] PathBuf),
    #[display("interrupted")]
    Interrupted,
}
