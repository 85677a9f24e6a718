//! EPUB parsing utilities (container.xml, OPF)

use std::collections::{BTreeSet, HashMap};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::html::unescape;

/// An entry of the OPF manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Path relative to the package document.
    pub href: String,
    pub media_type: String,
    pub properties: BTreeSet<String>,
}

impl ManifestItem {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.contains(property)
    }

    pub fn is_image(&self) -> bool {
        self.media_type.to_ascii_lowercase().starts_with("image/")
    }

    /// HTML-family content document, judged by media type or extension.
    pub fn is_html(&self) -> bool {
        matches!(self.media_type.as_str(), "application/xhtml+xml" | "text/html") || {
            let href = self.href.to_ascii_lowercase();
            href.ends_with(".xhtml") || href.ends_with(".html") || href.ends_with(".htm")
        }
    }
}

/// Manifest items in document order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: Vec<ManifestItem>,
    index: HashMap<String, usize>,
}

impl Manifest {
    /// Insert an item. A repeated id replaces the earlier item in place.
    pub fn insert(&mut self, item: ManifestItem) {
        match self.index.get(&item.id) {
            Some(&i) => self.items[i] = item,
            None => {
                self.index.insert(item.id.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ManifestItem> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parsed OPF package document.
#[derive(Debug, Clone, Default)]
pub struct Package {
    /// First non-empty `title` element.
    pub title: String,
    pub authors: Vec<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub manifest: Manifest,
    /// Manifest ids in reading order. Duplicates are kept.
    pub spine: Vec<String>,
    /// Declared cover image href, relative to the package document.
    pub cover_href: Option<String>,
}

impl Package {
    /// Guess a cover when the package declares none: the first image item
    /// whose id mentions "cover", or a JPEG/PNG whose href does.
    pub fn guess_cover_href(&self) -> Option<&str> {
        self.manifest
            .iter()
            .find(|item| {
                let id = item.id.to_ascii_lowercase();
                let href = item.href.to_ascii_lowercase();
                (item.is_image() && id.contains("cover"))
                    || (href.contains("cover")
                        && [".jpg", ".jpeg", ".png"].iter().any(|ext| href.ends_with(ext)))
            })
            .map(|item| item.href.as_str())
    }
}

/// Parse META-INF/container.xml to find the OPF path.
///
/// Returns the `full-path` of the first `rootfile` element.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = String::from_utf8_lossy(strip_bom(bytes));

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if local_name(e.name().as_ref()) == b"rootfile" => {
                return match attr(&e, b"full-path") {
                    Some(path) if !path.is_empty() => Ok(path),
                    _ => Err(Error::MissingRootfile),
                };
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(Error::MissingRootfile)
}

/// Parse OPF package document.
pub fn parse_opf(content: &str) -> Result<Package> {
    // Text is trimmed per element, not per event, so "A &amp; B" keeps its spaces.
    let mut reader = Reader::from_str(content);

    let mut package = Package::default();
    let mut epub3_cover: Option<String> = None;
    let mut epub2_cover_id: Option<String> = None;

    let mut current_element: Option<&'static str> = None;
    let mut buf_text = String::new();

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"item" => {
                        if let Some(item) = manifest_item(e) {
                            if epub3_cover.is_none() && item.has_property("cover-image") {
                                epub3_cover = Some(item.href.clone());
                            }
                            package.manifest.insert(item);
                        }
                    }
                    b"itemref" => {
                        if let Some(idref) = attr(e, b"idref").filter(|id| !id.is_empty()) {
                            package.spine.push(idref);
                        }
                    }
                    b"meta" => {
                        let is_cover = attr(e, b"name")
                            .is_some_and(|name| name.eq_ignore_ascii_case("cover"));
                        // A later declaration overrides an earlier one.
                        if is_cover
                            && let Some(content) = attr(e, b"content").filter(|c| !c.is_empty())
                        {
                            epub2_cover_id = Some(content);
                        }
                    }
                    local if matches!(event, Event::Start(_)) => {
                        current_element = match local {
                            b"title" => Some("title"),
                            b"creator" => Some("creator"),
                            b"language" => Some("language"),
                            b"description" => Some("description"),
                            _ => None,
                        };
                        buf_text.clear();
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if current_element.is_some() {
                    let entity = format!("&{};", String::from_utf8_lossy(e.as_ref()));
                    buf_text.push_str(&unescape(&entity));
                }
            }
            Event::End(_) => {
                if let Some(elem) = current_element.take() {
                    let text = buf_text.trim();
                    if !text.is_empty() {
                        match elem {
                            "title" if package.title.is_empty() => package.title = text.to_string(),
                            "creator" => package.authors.push(text.to_string()),
                            "language" if package.language.is_none() => {
                                package.language = Some(text.to_string())
                            }
                            "description" if package.description.is_none() => {
                                package.description = Some(text.to_string())
                            }
                            _ => {}
                        }
                    }
                    buf_text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    // EPUB3 "cover-image" property takes priority over the EPUB2 meta
    package.cover_href = epub3_cover.or_else(|| {
        epub2_cover_id
            .and_then(|id| package.manifest.get(&id))
            .map(|item| item.href.clone())
    });

    Ok(package)
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn manifest_item(e: &BytesStart<'_>) -> Option<ManifestItem> {
    let id = attr(e, b"id").filter(|id| !id.is_empty())?;
    let href = attr(e, b"href").filter(|href| !href.is_empty())?;
    let media_type = attr(e, b"media-type").unwrap_or_default();
    let properties = attr(e, b"properties")
        .map(|props| props.split_ascii_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    Some(ManifestItem {
        id,
        href,
        media_type,
        properties,
    })
}

/// Unescaped value of the attribute with the given local name.
fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| local_name(a.key.as_ref()) == key)
        .map(|a| unescape(&String::from_utf8_lossy(&a.value)).into_owned())
}

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}
