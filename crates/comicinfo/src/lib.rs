//! ComicInfo.xml metadata.
//!
//! [`ComicInfo`] mirrors the v2 schema used by most comic readers: a flat set
//! of optional scalars plus a list of [`Page`] records. [`from_xml`] and
//! [`to_xml`] convert between records and documents; everything else in the
//! workspace treats the record as plain data.
//!
//! ```
//! use tankobon_comicinfo::{ComicInfo, from_xml, to_xml};
//!
//! let mut info = ComicInfo::default();
//! info.set("series", "Saga").unwrap();
//! let xml = to_xml(&info).unwrap();
//! assert_eq!(from_xml(&xml).unwrap().series.as_deref(), Some("Saga"));
//! ```

pub mod error;
pub mod models;
mod schema;
mod xml;

pub use crate::models::{AgeRating, ComicInfo, Manga, Page, PageType, YesNo};
pub use crate::schema::{Field, FieldValue};
pub use crate::xml::{from_xml, to_xml};

/// Conventional name of the metadata entry inside an archive.
pub const FILE_NAME: &str = "ComicInfo.xml";
