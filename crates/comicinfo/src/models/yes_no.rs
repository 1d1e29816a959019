use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Tri-state flag used by `BlackAndWhite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum YesNo {
    #[default]
    Unknown,
    No,
    Yes,
}
impl YesNo {
    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Unknown => "Unknown",
            YesNo::No => "No",
            YesNo::Yes => "Yes",
        }
    }
}
impl FromStr for YesNo {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match sanitize(s).as_str() {
            "unknown" => Self::Unknown,
            "no" | "false" => Self::No,
            "yes" | "true" => Self::Yes,
            _ => exn::bail!(ErrorKind::ParseError { field: "yes/no", value: s.to_string() }),
        })
    }
}
impl Display for YesNo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
