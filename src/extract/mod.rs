//! Chapter content extraction.
//!
//! Two strategies are available:
//!
//! - [`ExtractMode::Blocks`] walks the markup and produces paragraph and image
//!   blocks, materializing embedded images through an [`ImageResolver`].
//! - [`ExtractMode::Lines`] flattens the markup into cleaned text lines and
//!   ignores images.
//!
//! Both share the same line-cleaning rule ([`clean_line`]) and only look at
//! the document body when one is present.

mod assets;
mod blocks;
mod lines;
mod title;

use std::fmt;
use std::str::FromStr;

pub use assets::{ASSET_SCHEME, AssetStore, ChapterImages, asset_file_name};
pub use blocks::{BlockBuilder, ChapterBlocks, ImageResolver, extract_blocks};
pub use lines::{ChapterLines, extract_lines};
pub use title::{chapter_title, extract_title};

use crate::html::{Token, Tokenizer};

/// Chapters with less text than this are not real chapters, unless block
/// extraction found images in them.
pub const MIN_CHAPTER_CHARS: usize = 80;

/// Content extraction strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractMode {
    /// Paragraph and image blocks; image-bearing chapters skip the length floor.
    #[default]
    Blocks,
    /// Plain text lines; the length floor always applies.
    Lines,
}

impl ExtractMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractMode::Blocks => "blocks",
            ExtractMode::Lines => "lines",
        }
    }
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blocks" | "block" => Ok(ExtractMode::Blocks),
            "lines" | "line" => Ok(ExtractMode::Lines),
            other => Err(format!("unknown extraction mode: {other} (expected blocks or lines)")),
        }
    }
}

/// Extraction result in the shape a chapter record needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub content_html: String,
    /// Character count used both as the record's word count and for the
    /// acceptance threshold.
    pub word_count: usize,
    /// `Some` for block extraction only.
    pub image_count: Option<usize>,
}

impl Extracted {
    /// Whether this spine item counts as a chapter.
    pub fn is_substantial(&self) -> bool {
        self.word_count >= MIN_CHAPTER_CHARS || self.image_count.is_some_and(|n| n > 0)
    }
}

impl From<ChapterBlocks> for Extracted {
    fn from(blocks: ChapterBlocks) -> Self {
        Extracted {
            content_html: blocks.to_content_html(),
            word_count: blocks.text_char_count(),
            image_count: Some(blocks.image_count),
        }
    }
}

impl From<ChapterLines> for Extracted {
    fn from(lines: ChapterLines) -> Self {
        Extracted {
            content_html: lines.to_content_html(),
            word_count: lines.char_count(),
            image_count: None,
        }
    }
}

/// Collapse whitespace and drop boilerplate.
///
/// Returns `None` for lines that are empty, say "cover page" or "title page",
/// start with an `@page` rule, or look like inline CSS.
///
/// ```
/// use epubseed::extract::clean_line;
///
/// assert_eq!(clean_line("  Call me\n   Ishmael. "), Some("Call me Ishmael.".to_string()));
/// assert_eq!(clean_line("Cover Page"), None);
/// assert_eq!(clean_line("p { margin: 0 }"), None);
/// ```
pub fn clean_line(line: &str) -> Option<String> {
    let text = line.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }

    let low = text.to_lowercase();
    if low == "cover page" || low == "title page" || low.starts_with("@page") {
        return None;
    }
    if text.contains('{') && text.contains('}') && text.contains(':') {
        return None;
    }

    Some(text)
}

/// Tokens of the document body, or of the whole document if it has no
/// `<body>` element. Stops at the first `</body>`.
pub fn body_tokens(markup: &str) -> impl Iterator<Item = Token<'_>> {
    let is_body_start = |t: &Token<'_>| matches!(t, Token::Start(tag) if tag.is("body"));
    let has_body = Tokenizer::new(markup).any(|t| is_body_start(&t));

    Tokenizer::new(markup)
        .skip_while(move |t| has_body && !is_body_start(t))
        .skip(usize::from(has_body))
        .take_while(|t| !matches!(t, Token::End(name) if name.eq_ignore_ascii_case("body")))
}
