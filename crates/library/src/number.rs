//! Numeric tokens in entry names.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// A non-negative decimal such as `7` or `12.5`, kept as an integer part and
/// the literal digits after the point so that `1.50` survives unchanged.
#[derive(Debug, Clone, Default)]
pub struct Number {
    pub int: u64,
    /// Digits after the decimal point, without the point.
    pub frac: Option<String>,
}

impl Number {
    pub fn new(int: u64) -> Self {
        Self { int, frac: None }
    }

    /// Same fraction, different integer part.
    pub fn with_int(&self, int: u64) -> Self {
        Self { int, frac: self.frac.clone() }
    }

    /// Fraction digits that affect the value.
    fn significant_frac(&self) -> &str {
        self.frac.as_deref().unwrap_or("").trim_end_matches('0')
    }

    /// Render with the integer part zero-padded to `width` digits.
    pub fn padded(&self, width: usize) -> String {
        match &self.frac {
            Some(frac) => format!("{:0width$}.{frac}", self.int),
            None => format!("{:0width$}", self.int),
        }
    }
}

/// Number of decimal digits in `n`.
pub fn digits(n: u64) -> usize {
    n.checked_ilog10().map_or(1, |log| log as usize + 1)
}

impl FromStr for Number {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (int, frac) = match s.split_once('.') {
            Some((int, frac)) => (int, Some(frac.to_string())),
            None => (s, None),
        };
        Ok(Self { int: int.parse()?, frac })
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.padded(0))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        // Without trailing zeros, fraction digits order lexicographically.
        self.int.cmp(&other.int).then_with(|| self.significant_frac().cmp(other.significant_frac()))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.int.hash(state);
        self.significant_frac().hash(state);
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("7", 7, None)]
    #[case("007", 7, None)]
    #[case("12.5", 12, Some("5"))]
    #[case("1.50", 1, Some("50"))]
    fn parse(#[case] input: &str, #[case] int: u64, #[case] frac: Option<&str>) {
        let number: Number = input.parse().unwrap();
        assert_eq!(number.int, int);
        assert_eq!(number.frac.as_deref(), frac);
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!("99999999999999999999999".parse::<Number>().is_err());
    }

    #[rstest]
    #[case("1", "2", Ordering::Less)]
    #[case("2.5", "2", Ordering::Greater)]
    #[case("2.5", "2.50", Ordering::Equal)]
    #[case("2.25", "2.5", Ordering::Less)]
    #[case("10", "9.9", Ordering::Greater)]
    fn ordering(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(a.parse::<Number>().unwrap().cmp(&b.parse().unwrap()), expected);
    }

    #[test]
    fn padding() {
        assert_eq!("7".parse::<Number>().unwrap().padded(3), "007");
        assert_eq!("7.5".parse::<Number>().unwrap().padded(3), "007.5");
        assert_eq!(Number::new(1234).padded(2), "1234");
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(999), 3);
    }
}
