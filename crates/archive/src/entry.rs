//! Entry model.
//!
//! An [`Entry`] is a view over one container member name. Nothing here touches
//! the member's bytes: image-ness comes from the extension alone.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static COVER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)cover").unwrap());

/// A container member, with attributes derived from its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Full member name, `/` separated. Directories end with `/`.
    pub name: String,
    /// Last path segment without its extension.
    pub base_name: String,
    /// Everything before the last segment, without a trailing `/`.
    pub dir: Option<String>,
    /// Extension including the leading dot, or empty.
    pub ext: String,
    pub is_directory: bool,
    pub is_image: bool,
    /// A file whose base name contains "cover", in any case.
    pub is_cover: bool,
    pub mime: Option<&'static str>,
}

impl Entry {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let is_directory = name.ends_with('/');
        let trimmed = name.trim_end_matches('/');
        let (dir, file_name) = match trimmed.rsplit_once('/') {
            Some((dir, file_name)) => (Some(dir.to_string()), file_name),
            None => (None, trimmed),
        };
        // A leading dot marks a hidden file, not an extension.
        let (base_name, ext) = match file_name.rfind('.') {
            Some(i) if i > 0 && !is_directory => (&file_name[..i], &file_name[i..]),
            _ => (file_name, ""),
        };
        let mime = if is_directory { None } else { mime_for_extension(ext) };
        Self {
            is_image: mime.is_some_and(|mime| mime.starts_with("image/")),
            is_cover: !is_directory && COVER_REGEX.is_match(base_name),
            base_name: base_name.to_string(),
            ext: ext.to_string(),
            dir,
            is_directory,
            mime,
            name,
        }
    }

    /// Base name plus extension.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.base_name, self.ext)
    }

    /// Whether this is the embedded metadata document.
    pub fn is_metadata(&self) -> bool {
        self.name.eq_ignore_ascii_case(tankobon_comicinfo::FILE_NAME)
    }
}

/// MIME type for a file extension (with or without the dot).
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    Some(match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        "jxl" => "image/jxl",
        "svg" => "image/svg+xml",
        "xml" => "application/xml",
        "json" => "application/json",
        "txt" | "nfo" => "text/plain",
        "htm" | "html" => "text/html",
        "pdf" => "application/pdf",
        _ => return None,
    })
}

/// Canonical page order: plain ordinal comparison of member names.
pub fn sort_canonical(entries: &mut [Entry]) {
    entries.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Numeric-aware, case-insensitive name order, so `page2` sorts before
/// `page10`.
pub fn natural_cmp(a: &Entry, b: &Entry) -> Ordering {
    natord::compare_ignore_case(&a.name, &b.name)
}
