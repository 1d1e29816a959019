use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Role of a single page within the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageType {
    FrontCover,
    InnerCover,
    Roundup,
    #[default]
    Story,
    Advertisement,
    Editorial,
    Letters,
    Preview,
    BackCover,
    Other,
    Deleted,
}
impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::FrontCover => "FrontCover",
            PageType::InnerCover => "InnerCover",
            PageType::Roundup => "Roundup",
            PageType::Story => "Story",
            PageType::Advertisement => "Advertisement",
            PageType::Editorial => "Editorial",
            PageType::Letters => "Letters",
            PageType::Preview => "Preview",
            PageType::BackCover => "BackCover",
            PageType::Other => "Other",
            PageType::Deleted => "Deleted",
        }
    }
}
impl FromStr for PageType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match sanitize(s).as_str() {
            "frontcover" | "cover" => Self::FrontCover,
            "innercover" => Self::InnerCover,
            "roundup" => Self::Roundup,
            "story" => Self::Story,
            "advertisement" | "ad" => Self::Advertisement,
            "editorial" => Self::Editorial,
            "letters" => Self::Letters,
            "preview" => Self::Preview,
            "backcover" => Self::BackCover,
            "other" => Self::Other,
            "deleted" => Self::Deleted,
            _ => exn::bail!(ErrorKind::ParseError { field: "type", value: s.to_string() }),
        })
    }
}
impl Display for PageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
