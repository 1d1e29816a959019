use crate::models::PageType;
use crate::schema::{Field, fields};

/// One `<Page>` record. Every value is stored as an XML attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Zero-based index of the image within the archive.
    pub image: Option<i32>,
    pub page_type: Option<PageType>,
    pub double_page: Option<bool>,
    /// File size in bytes, kept as the text found in the document.
    pub image_size: Option<String>,
    pub key: Option<String>,
    pub bookmark: Option<String>,
    pub image_width: Option<i32>,
    pub image_height: Option<i32>,
}

impl Page {
    /// Attribute table, in the order attributes are written.
    pub const FIELDS: &'static [Field<Self>] = fields!(Self {
        image: i32 => "Image",
        page_type: PageType => "Type",
        double_page: bool => "DoublePage",
        image_size: String => "ImageSize",
        key: String => "Key",
        bookmark: String => "Bookmark",
        image_width: i32 => "ImageWidth",
        image_height: i32 => "ImageHeight",
    });

    /// A page pointing at `image` with the given role.
    pub fn new(image: i32, page_type: PageType) -> Self {
        Self { image: Some(image), page_type: Some(page_type), ..Self::default() }
    }
}
