//! # epubseed
//!
//! Convert EPUB e-books into JSON/JSONL seed records for a document store.
//!
//! ## Pipeline
//!
//! 1. `META-INF/container.xml` points at the package document, which yields
//!    the manifest, the spine and the cover ([`epub`]).
//! 2. Each spine document is decoded ([`util::decode_chapter`]) and its body
//!    reduced to paragraphs and images ([`extract`]).
//! 3. Documents with enough content become numbered chapters ([`Converter`]).
//! 4. Records are written as JSON arrays, JSONL and ASCII-safe "compat"
//!    JSONL ([`export`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use epubseed::export::{OutputOptions, write_conversion};
//! use epubseed::{AssetStore, ConvertOptions, Converter};
//!
//! let mut converter = Converter::open("book.epub")?;
//! let mut assets = AssetStore::recreate("seed/assets/demo")?;
//! let conversion = converter.convert(&ConvertOptions::new("demo"), &mut assets)?;
//!
//! let options = OutputOptions::default().with_compat(true);
//! write_conversion(Path::new("out"), &conversion, &options)?;
//! # Ok::<(), epubseed::Error>(())
//! ```

pub mod book;
pub mod convert;
pub mod epub;
pub mod error;
pub mod export;
pub mod extract;
pub mod html;
pub mod util;

pub use book::{BookRecord, ChapterRecord, ContentBlock};
pub use convert::{Conversion, ConvertOptions, Converter, CoverImage};
pub use error::{Error, Result};
pub use extract::{AssetStore, ExtractMode};
