//! Spine walk that turns a package into book and chapter records.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::book::{BookRecord, ChapterRecord};
use crate::epub::{EpubArchive, Package, extension, parent_dir, parse_container_xml, parse_opf};
use crate::error::{Error, Result};
use crate::extract::{AssetStore, ExtractMode, Extracted, chapter_title, extract_blocks, extract_lines};
use crate::html::strip_tags;
use crate::util::decode_chapter;

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Written into every record's `bookId`.
    pub book_id: String,
    pub mode: ExtractMode,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::new("book")
    }
}

impl ConvertOptions {
    pub fn new(book_id: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            mode: ExtractMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ExtractMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Raw cover image bytes and where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub archive_path: String,
    pub data: Vec<u8>,
}

impl CoverImage {
    /// Lower-cased extension with the dot, `.jpg` when the entry has none.
    pub fn extension(&self) -> String {
        extension(&self.archive_path).unwrap_or_else(|| ".jpg".to_string())
    }

    /// `{book_id}-cover{ext}`
    pub fn file_name(&self, book_id: &str) -> String {
        format!("{}-cover{}", book_id, self.extension())
    }
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub book: BookRecord,
    pub chapters: Vec<ChapterRecord>,
    pub cover: Option<CoverImage>,
    /// Distinct images materialized into the asset store.
    pub asset_count: usize,
}

/// An opened EPUB whose package document has been parsed.
///
/// # Example
///
/// ```no_run
/// use epubseed::{AssetStore, ConvertOptions, Converter};
///
/// let mut converter = Converter::open("book.epub")?;
/// let mut assets = AssetStore::recreate("assets/demo")?;
/// let conversion = converter.convert(&ConvertOptions::new("demo"), &mut assets)?;
/// println!("{} chapters", conversion.chapters.len());
/// # Ok::<(), epubseed::Error>(())
/// ```
pub struct Converter<R> {
    archive: EpubArchive<R>,
    opf_path: String,
    package: Package,
    /// Title of last resort, usually the file stem.
    source_name: String,
}

impl Converter<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_archive(EpubArchive::open(path)?)?.with_source_name(stem))
    }
}

impl<R: Read + Seek> Converter<R> {
    /// Read an EPUB from any [`Read`] + [`Seek`] source.
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::from_archive(EpubArchive::from_reader(reader)?)
    }

    fn from_archive(mut archive: EpubArchive<R>) -> Result<Self> {
        let container = archive.read_container()?;
        let opf_path = parse_container_xml(&container)?;

        let opf_bytes = match archive.read(&opf_path) {
            Err(Error::UnresolvableReference(path)) => {
                return Err(Error::InvalidEpub(format!("package document {path} not found")));
            }
            other => other?,
        };
        let package = parse_opf(&decode_chapter(&opf_bytes).text)?;

        Ok(Self {
            archive,
            opf_path,
            package,
            source_name: String::new(),
        })
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Archive path of the package document.
    pub fn opf_path(&self) -> &str {
        &self.opf_path
    }

    /// The cover the package declares, if it resolves to an archive entry.
    pub fn cover(&mut self) -> Result<Option<CoverImage>> {
        match self.package.cover_href.clone() {
            Some(href) => self.read_cover(&href),
            None => Ok(None),
        }
    }

    /// The declared cover, else the first manifest item that looks like one.
    pub fn find_cover(&mut self) -> Result<Option<CoverImage>> {
        if let Some(cover) = self.cover()? {
            return Ok(Some(cover));
        }
        match self.package.guess_cover_href().map(str::to_string) {
            Some(href) => self.read_cover(&href),
            None => Ok(None),
        }
    }

    fn read_cover(&mut self, href: &str) -> Result<Option<CoverImage>> {
        let Some(archive_path) = self.archive.resolve(parent_dir(&self.opf_path), href) else {
            log::debug!("cover {href} not found in archive");
            return Ok(None);
        };
        let data = self.archive.read(&archive_path)?;
        Ok(Some(CoverImage { archive_path, data }))
    }

    /// Walk the spine and build the book and its accepted chapters.
    ///
    /// Images found in block mode are written through `assets`. Fails with
    /// [`Error::NoChaptersExtracted`] if no spine item passes the length floor.
    pub fn convert(&mut self, options: &ConvertOptions, assets: &mut AssetStore) -> Result<Conversion> {
        let opf_dir = parent_dir(&self.opf_path);
        let mut chapters: Vec<ChapterRecord> = Vec::new();

        for idref in &self.package.spine {
            let Some(item) = self.package.manifest.get(idref) else {
                log::debug!("spine idref {idref} has no manifest item");
                continue;
            };
            if !item.is_html() {
                log::debug!("skipping non-document spine item {} ({})", item.href, item.media_type);
                continue;
            }
            let Some(path) = self.archive.resolve(opf_dir, &item.href) else {
                log::debug!("spine item {} not found in archive", item.href);
                continue;
            };

            let decoded = decode_chapter(&self.archive.read(&path)?);
            if decoded.lossy {
                log::warn!("{path}: invalid byte sequences replaced while decoding");
            }

            let extracted: Extracted = match options.mode {
                ExtractMode::Blocks => {
                    extract_blocks(&decoded.text, assets.for_chapter(&mut self.archive, &path))?.into()
                }
                ExtractMode::Lines => extract_lines(&decoded.text).into(),
            };
            if !extracted.is_substantial() {
                log::debug!("skipping {path}: {} characters of text", extracted.word_count);
                continue;
            }

            let chapter_no = chapters.len() + 1;
            chapters.push(ChapterRecord {
                book_id: options.book_id.clone(),
                chapter_no,
                chapter_title: chapter_title(&decoded.text, chapter_no),
                content_html: extracted.content_html,
                word_count: extracted.word_count,
                image_count: extracted.image_count,
            });
        }

        if chapters.is_empty() {
            return Err(Error::NoChaptersExtracted);
        }

        let book = self.book_record(&options.book_id, chapters.len());
        let cover = self.cover()?;
        log::info!(
            "converted {:?}: {} chapters, {} assets",
            book.title,
            chapters.len(),
            assets.len()
        );

        Ok(Conversion {
            book,
            chapters,
            cover,
            asset_count: assets.len(),
        })
    }

    fn book_record(&self, book_id: &str, chapter_count: usize) -> BookRecord {
        let title = [self.package.title.trim(), self.source_name.trim()]
            .into_iter()
            .find(|t| !t.is_empty())
            .unwrap_or("Untitled");

        let mut book = BookRecord::new(book_id, title)
            .with_author(self.package.authors.join(", "))
            .with_chapter_count(chapter_count);

        if let Some(description) = &self.package.description {
            let intro = strip_tags(description).split_whitespace().collect::<Vec<_>>().join(" ");
            if !intro.is_empty() {
                book = book.with_intro(intro);
            }
        }
        book
    }
}
