//! Field tables.
//!
//! Every record in this crate carries an ordered table of [`Field`]s that
//! ties a field's key to its XML name and to typed accessors. The codec, the
//! patch helpers and the CLI all walk these tables instead of matching on
//! names, so adding a field to the schema is a one-line change.

use std::str::FromStr;

use crate::error::{ErrorKind, Result};
use crate::models::{AgeRating, Manga, PageType, YesNo};

/// Conversion between a typed field value and its XML text.
pub trait FieldValue: Sized + Clone {
    /// Parse XML text. Returns `None` when the text is not a valid value.
    fn parse(text: &str) -> Option<Self>;
    /// Render the value as XML text.
    fn render(&self) -> String;
}

impl FieldValue for String {
    fn parse(text: &str) -> Option<Self> {
        // Text content is significant, including surrounding whitespace.
        Some(text.to_string())
    }
    fn render(&self) -> String {
        self.clone()
    }
}

impl FieldValue for bool {
    fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
    fn render(&self) -> String {
        self.to_string()
    }
}

macro_rules! numeric_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn parse(text: &str) -> Option<Self> {
                    text.trim().parse().ok()
                }
                fn render(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}
numeric_value!(i32, f64);

macro_rules! keyword_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn parse(text: &str) -> Option<Self> {
                    <$ty as FromStr>::from_str(text).ok()
                }
                fn render(&self) -> String {
                    self.as_str().to_string()
                }
            }
        )*
    };
}
keyword_value!(YesNo, Manga, AgeRating, PageType);

/// One entry of a record's field table.
pub struct Field<R: 'static> {
    /// Key used by callers, e.g. `cover_artist`.
    pub name: &'static str,
    /// XML element (or attribute) name, e.g. `CoverArtist`.
    pub element: &'static str,
    pub(crate) get: fn(&R) -> Option<String>,
    pub(crate) set: fn(&mut R, &str) -> bool,
    pub(crate) copy: fn(&R, &mut R),
    pub(crate) clear: fn(&mut R),
}

impl<R: 'static> Field<R> {
    /// Rendered value of this field, if set.
    pub fn get(&self, record: &R) -> Option<String> {
        (self.get)(record)
    }

    /// Parse `text` and store it in this field.
    pub fn set(&self, record: &mut R, text: &str) -> Result<()> {
        if !(self.set)(record, text) {
            exn::bail!(ErrorKind::ParseError { field: self.name, value: text.to_string() });
        }
        Ok(())
    }

    /// Copy this field from `from` into `to`, but only when `from` has it set.
    pub fn copy(&self, from: &R, to: &mut R) {
        (self.copy)(from, to)
    }

    /// Unset this field.
    pub fn clear(&self, record: &mut R) {
        (self.clear)(record)
    }

    /// Whether `key` names this field, either by key or by XML name.
    pub fn matches(&self, key: &str) -> bool {
        self.name.eq_ignore_ascii_case(key) || self.element.eq_ignore_ascii_case(key)
    }
}

/// Look up a field in `table` by key or XML name, ignoring ASCII case.
pub fn lookup<R: 'static>(table: &'static [Field<R>], key: &str) -> Result<&'static Field<R>> {
    table
        .iter()
        .find(|field| field.matches(key))
        .ok_or_else(|| exn::Exn::from(ErrorKind::UnknownField(key.to_string())))
}

/// Build a static field table for a record whose fields are all `Option<T>`.
macro_rules! fields {
    ($record:ty { $($field:ident: $ty:ty => $element:literal),* $(,)? }) => {
        &[
            $(
                $crate::schema::Field::<$record> {
                    name: stringify!($field),
                    element: $element,
                    get: |record| record.$field.as_ref().map(<$ty as $crate::schema::FieldValue>::render),
                    set: |record, text| match <$ty as $crate::schema::FieldValue>::parse(text) {
                        Some(value) => {
                            record.$field = Some(value);
                            true
                        },
                        None => false,
                    },
                    copy: |from, to| {
                        if let Some(value) = &from.$field {
                            to.$field = Some(value.clone());
                        }
                    },
                    clear: |record| record.$field = None,
                },
            )*
        ]
    };
}
pub(crate) use fields;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12", Some(12))]
    #[case(" 7 ", Some(7))]
    #[case("-3", Some(-3))]
    #[case("twelve", None)]
    #[case("", None)]
    fn parse_integers(#[case] text: &str, #[case] expected: Option<i32>) {
        assert_eq!(<i32 as FieldValue>::parse(text), expected);
    }

    #[rstest]
    #[case("true", Some(true))]
    #[case("False", Some(false))]
    #[case("1", Some(true))]
    #[case("maybe", None)]
    fn parse_booleans(#[case] text: &str, #[case] expected: Option<bool>) {
        assert_eq!(<bool as FieldValue>::parse(text), expected);
    }

    #[test]
    fn strings_keep_whitespace() {
        assert_eq!(<String as FieldValue>::parse("  padded  ").as_deref(), Some("  padded  "));
    }

    #[test]
    fn keywords_render_schema_spelling() {
        assert_eq!(AgeRating::Mature17.render(), "Mature 17+");
        assert_eq!(<AgeRating as FieldValue>::parse("mature 17+"), Some(AgeRating::Mature17));
        assert_eq!(<Manga as FieldValue>::parse("YesAndRightToLeft"), Some(Manga::YesAndRightToLeft));
        assert_eq!(<PageType as FieldValue>::parse("Sideways"), None);
    }
}
