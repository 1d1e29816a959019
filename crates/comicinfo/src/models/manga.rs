use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Whether the book is a manga, and which way it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Manga {
    #[default]
    Unknown,
    No,
    Yes,
    /// Manga read right to left; readers should reverse page turns.
    YesAndRightToLeft,
}
impl Manga {
    pub fn as_str(&self) -> &'static str {
        match self {
            Manga::Unknown => "Unknown",
            Manga::No => "No",
            Manga::Yes => "Yes",
            Manga::YesAndRightToLeft => "YesAndRightToLeft",
        }
    }

    /// Returns `true` if pages are ordered right to left.
    pub fn is_right_to_left(&self) -> bool {
        matches!(self, Manga::YesAndRightToLeft)
    }
}
impl FromStr for Manga {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match sanitize(s).as_str() {
            "unknown" => Self::Unknown,
            "no" => Self::No,
            "yes" => Self::Yes,
            "yesandrighttoleft" | "rtl" => Self::YesAndRightToLeft,
            _ => exn::bail!(ErrorKind::ParseError { field: "manga", value: s.to_string() }),
        })
    }
}
impl Display for Manga {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
