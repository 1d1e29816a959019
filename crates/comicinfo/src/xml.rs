//! ComicInfo.xml codec.

use exn::ResultExt;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::{ComicInfo, Page};
use crate::schema::Field;

const ROOT: &str = "ComicInfo";
const PAGES: &str = "Pages";
const PAGE: &str = "Page";
const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD: &str = "http://www.w3.org/2001/XMLSchema";

/// Render a record as an indented ComicInfo document.
///
/// Unset fields are omitted, fields are written in schema order, and the
/// `<Pages>` block only appears when there is at least one page.
#[instrument(level = "debug", skip_all)]
pub fn to_xml(info: &ComicInfo) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None))).or_raise(|| ErrorKind::Encode)?;
    let mut root = BytesStart::new(ROOT);
    root.push_attribute(("xmlns:xsi", XSI));
    root.push_attribute(("xmlns:xsd", XSD));
    writer.write_event(Event::Start(root)).or_raise(|| ErrorKind::Encode)?;

    for (element, value) in info.values() {
        writer.write_event(Event::Start(BytesStart::new(element))).or_raise(|| ErrorKind::Encode)?;
        writer.write_event(Event::Text(BytesText::new(&value))).or_raise(|| ErrorKind::Encode)?;
        writer.write_event(Event::End(BytesEnd::new(element))).or_raise(|| ErrorKind::Encode)?;
    }

    if !info.pages.is_empty() {
        writer.write_event(Event::Start(BytesStart::new(PAGES))).or_raise(|| ErrorKind::Encode)?;
        for page in &info.pages {
            let mut element = BytesStart::new(PAGE);
            for field in Page::FIELDS {
                if let Some(value) = field.get(page) {
                    element.push_attribute((field.element, value.as_str()));
                }
            }
            writer.write_event(Event::Empty(element)).or_raise(|| ErrorKind::Encode)?;
        }
        writer.write_event(Event::End(BytesEnd::new(PAGES))).or_raise(|| ErrorKind::Encode)?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT))).or_raise(|| ErrorKind::Encode)?;
    String::from_utf8(writer.into_inner()).or_raise(|| ErrorKind::Encode)
}

/// Parse a ComicInfo document.
///
/// Element names are matched without regard to case and unknown elements are
/// skipped. A value that does not parse as its field's type leaves the field
/// unset rather than failing the whole document.
#[instrument(level = "debug", skip_all, fields(xml_size = xml.len()))]
pub fn from_xml(xml: &str) -> Result<ComicInfo> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut info = ComicInfo::default();
    let mut depth = 0usize;
    let mut found_root = false;
    let mut in_pages = false;
    let mut current: Option<(&'static Field<ComicInfo>, String)> = None;

    loop {
        match reader.read_event().or_raise(|| ErrorKind::MalformedXml)? {
            Event::Start(element) => {
                depth += 1;
                let name = element.local_name();
                let name = std::str::from_utf8(name.as_ref()).or_raise(|| ErrorKind::MalformedXml)?;
                match depth {
                    1 => found_root = name.eq_ignore_ascii_case(ROOT),
                    2 if found_root && name.eq_ignore_ascii_case(PAGES) => in_pages = true,
                    2 if found_root => current = scalar_field(name).map(|field| (field, String::new())),
                    3 if in_pages && name.eq_ignore_ascii_case(PAGE) => info.pages.push(read_page(&element)?),
                    _ => {},
                }
            },
            Event::Empty(element) => {
                let name = element.local_name();
                let name = std::str::from_utf8(name.as_ref()).or_raise(|| ErrorKind::MalformedXml)?;
                match depth + 1 {
                    // `<ComicInfo/>` is a valid, empty document.
                    1 => found_root = name.eq_ignore_ascii_case(ROOT),
                    2 if found_root => {
                        if let Some(field) = scalar_field(name) {
                            store(&mut info, field, "");
                        }
                    },
                    3 if in_pages && name.eq_ignore_ascii_case(PAGE) => info.pages.push(read_page(&element)?),
                    _ => {},
                }
            },
            Event::Text(text) if depth == 2 => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&text.unescape().or_raise(|| ErrorKind::MalformedXml)?);
                }
            },
            Event::CData(data) if depth == 2 => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&data));
                }
            },
            Event::End(_) => {
                if depth == 2 {
                    if let Some((field, value)) = current.take() {
                        store(&mut info, field, &value);
                    }
                    in_pages = false;
                }
                depth = depth.saturating_sub(1);
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if !found_root {
        exn::bail!(ErrorKind::MissingRoot);
    }
    Ok(info)
}

fn scalar_field(name: &str) -> Option<&'static Field<ComicInfo>> {
    let field = ComicInfo::FIELDS.iter().find(|field| field.element.eq_ignore_ascii_case(name));
    if field.is_none() {
        tracing::trace!(element = name, "Skipping unknown element");
    }
    field
}

fn store(info: &mut ComicInfo, field: &'static Field<ComicInfo>, value: &str) {
    if field.set(info, value).is_err() {
        tracing::debug!(field = field.name, value, "Ignoring unparseable value");
    }
}

fn read_page(element: &BytesStart<'_>) -> Result<Page> {
    let mut page = Page::default();
    for attribute in element.attributes() {
        let attribute = attribute.or_raise(|| ErrorKind::MalformedXml)?;
        let key = attribute.key.local_name();
        let key = std::str::from_utf8(key.as_ref()).or_raise(|| ErrorKind::MalformedXml)?;
        let Some(field) = Page::FIELDS.iter().find(|field| field.element.eq_ignore_ascii_case(key)) else {
            continue;
        };
        let value = attribute.unescape_value().or_raise(|| ErrorKind::MalformedXml)?;
        if field.set(&mut page, &value).is_err() {
            tracing::debug!(attribute = key, value = %value, "Ignoring unparseable page attribute");
        }
    }
    Ok(page)
}
