use std::str::FromStr;

use image::Rgba;

use crate::error::{Error, ErrorKind};

/// An RGBA colour parsed from CSS-style hex notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub Rgba<u8>);

impl Color {
    pub const WHITE: Color = Color(Rgba([255, 255, 255, 255]));
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Accepts `#rgb`, `#rgba`, `#rrggbb` and `#rrggbbaa`; the `#` is optional.
impl FromStr for Color {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || exn::Exn::from(ErrorKind::InvalidColor(s.to_string()));
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        let short = |i: usize| channel(&hex[i..=i].repeat(2));
        let long = |i: usize| channel(&hex[i * 2..i * 2 + 2]);
        let rgba = match hex.len() {
            3 => [short(0)?, short(1)?, short(2)?, 255],
            4 => [short(0)?, short(1)?, short(2)?, short(3)?],
            6 => [long(0)?, long(1)?, long(2)?, 255],
            8 => [long(0)?, long(1)?, long(2)?, long(3)?],
            _ => return Err(invalid()),
        };
        Ok(Self(Rgba(rgba)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("#fff", [255, 255, 255, 255])]
    #[case("000", [0, 0, 0, 255])]
    #[case("#f008", [255, 0, 0, 136])]
    #[case("#1a2B3c", [26, 43, 60, 255])]
    #[case("#00000080", [0, 0, 0, 128])]
    fn parse_hex(#[case] input: &str, #[case] expected: [u8; 4]) {
        assert_eq!(input.parse::<Color>().unwrap(), Color(Rgba(expected)));
    }

    #[rstest]
    #[case("")]
    #[case("#ff")]
    #[case("#ggg")]
    #[case("#12345")]
    #[case("white")]
    fn reject_invalid(#[case] input: &str) {
        let err = input.parse::<Color>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidColor(_)));
    }

    #[test]
    fn default_is_white() {
        assert_eq!(Color::default(), Color::WHITE);
    }
}
