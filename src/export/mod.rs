//! Writing conversion results and reconciling seed files.
//!
//! A conversion directory holds:
//!
//! - `books.json` / `book_chapters.json`: pretty JSON arrays
//! - `books.jsonl` / `book_chapters.jsonl`: one compact record per line
//! - `books.compat.jsonl` / `book_chapters.compat.jsonl`: ASCII-escaped
//!   JSONL with title substitutions (see [`compat_jsonl`])
//! - `<bookId>-cover<ext>`: the cover image
//!
//! The directory-level functions ([`json_to_jsonl`], [`compat_dir`],
//! [`seed_dir`]) rerun individual stages on files already on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::{Conversion, CoverImage};
use crate::error::Result;

mod compat;
mod json;

pub use compat::{AsciiFormatter, CompatOptions, compat_jsonl, to_ascii_json};
pub use json::{
    jsonl_to_seed_array, parse_jsonl, read_json_array, read_jsonl, to_json_array_string,
    to_jsonl_string, write_json_array, write_jsonl,
};

/// Base names of the two record files.
pub const BOOKS: &str = "books";
pub const BOOK_CHAPTERS: &str = "book_chapters";

/// Which optional files [`write_conversion`] produces.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub jsonl: bool,
    /// Implies `jsonl`.
    pub compat: bool,
    pub compat_options: CompatOptions,
}

impl OutputOptions {
    pub fn with_jsonl(mut self, jsonl: bool) -> Self {
        self.jsonl = jsonl;
        self
    }

    pub fn with_compat(mut self, compat: bool) -> Self {
        self.compat = compat;
        self
    }
}

/// Write the record files for `conversion` into `dir`, creating it if
/// needed. Returns the paths written, in order.
pub fn write_conversion(dir: &Path, conversion: &Conversion, options: &OutputOptions) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let books = std::slice::from_ref(&conversion.book);
    let mut written = Vec::new();

    let path = dir.join(format!("{BOOKS}.json"));
    write_json_array(&path, books)?;
    written.push(path);

    let path = dir.join(format!("{BOOK_CHAPTERS}.json"));
    write_json_array(&path, &conversion.chapters)?;
    written.push(path);

    if options.jsonl || options.compat {
        let books_jsonl = to_jsonl_string(books)?;
        let chapters_jsonl = to_jsonl_string(&conversion.chapters)?;

        for (name, content) in [(BOOKS, &books_jsonl), (BOOK_CHAPTERS, &chapters_jsonl)] {
            let path = dir.join(format!("{name}.jsonl"));
            fs::write(&path, content)?;
            written.push(path);
        }

        if options.compat {
            for (name, content) in [(BOOKS, &books_jsonl), (BOOK_CHAPTERS, &chapters_jsonl)] {
                let path = dir.join(format!("{name}.compat.jsonl"));
                fs::write(&path, compat_jsonl(content, &options.compat_options)?)?;
                written.push(path);
            }
        }
    }

    Ok(written)
}

/// Write the cover as `<book_id>-cover<ext>` into `dir`.
pub fn write_cover(dir: &Path, book_id: &str, cover: &CoverImage) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(cover.file_name(book_id));
    fs::write(&path, &cover.data)?;
    Ok(path)
}

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    Ok(())
}

/// Rewrite `books.json` / `book_chapters.json` in `dir` as JSONL.
pub fn json_to_jsonl(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for name in [BOOKS, BOOK_CHAPTERS] {
        let records = read_json_array(&dir.join(format!("{name}.json")))?;
        let path = dir.join(format!("{name}.jsonl"));
        write_jsonl(&path, &records)?;
        log::info!("{}: {} records", path.display(), records.len());
        written.push(path);
    }
    Ok(written)
}

/// Write `*.compat.jsonl` next to each `*.jsonl` record file in `dir`.
pub fn compat_dir(dir: &Path, options: &CompatOptions) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for name in [BOOKS, BOOK_CHAPTERS] {
        let input = fs::read_to_string(dir.join(format!("{name}.jsonl")))?;
        let path = dir.join(format!("{name}.compat.jsonl"));
        fs::write(&path, compat_jsonl(&input, options)?)?;
        written.push(path);
    }
    Ok(written)
}

/// Fold the compat JSONL files in `dir` into `<name>.<suffix>.json` seed
/// arrays under `out`.
pub fn seed_dir(dir: &Path, out: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out)?;
    let mut written = Vec::new();
    for name in [BOOKS, BOOK_CHAPTERS] {
        let input = fs::read_to_string(dir.join(format!("{name}.compat.jsonl")))?;
        let path = out.join(format!("{name}.{suffix}.json"));
        fs::write(&path, jsonl_to_seed_array(&input)?)?;
        written.push(path);
    }
    Ok(written)
}
