use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Audience rating, using the vocabulary of the ComicInfo schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AgeRating {
    #[default]
    Unknown,
    AdultsOnly18,
    EarlyChildhood,
    Everyone,
    Everyone10,
    G,
    KidsToAdults,
    M,
    Ma15,
    Mature17,
    Pg,
    R18,
    RatingPending,
    Teen,
    X18,
}
impl AgeRating {
    /// Returns the value exactly as the schema spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRating::Unknown => "Unknown",
            AgeRating::AdultsOnly18 => "Adults Only 18+",
            AgeRating::EarlyChildhood => "Early Childhood",
            AgeRating::Everyone => "Everyone",
            AgeRating::Everyone10 => "Everyone 10+",
            AgeRating::G => "G",
            AgeRating::KidsToAdults => "Kids to Adults",
            AgeRating::M => "M",
            AgeRating::Ma15 => "MA15+",
            AgeRating::Mature17 => "Mature 17+",
            AgeRating::Pg => "PG",
            AgeRating::R18 => "R18+",
            AgeRating::RatingPending => "Rating Pending",
            AgeRating::Teen => "Teen",
            AgeRating::X18 => "X18+",
        }
    }
}
impl FromStr for AgeRating {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match sanitize(s).as_str() {
            "unknown" => Self::Unknown,
            "adultsonly18+" | "adultsonly" => Self::AdultsOnly18,
            "earlychildhood" => Self::EarlyChildhood,
            "everyone" => Self::Everyone,
            "everyone10+" => Self::Everyone10,
            "g" => Self::G,
            "kidstoadults" => Self::KidsToAdults,
            "m" => Self::M,
            "ma15+" => Self::Ma15,
            "mature17+" | "mature" => Self::Mature17,
            "pg" => Self::Pg,
            "r18+" => Self::R18,
            "ratingpending" => Self::RatingPending,
            "teen" => Self::Teen,
            "x18+" => Self::X18,
            _ => exn::bail!(ErrorKind::ParseError { field: "ageRating", value: s.to_string() }),
        })
    }
}
impl Display for AgeRating {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
