//! Seed records produced by a conversion.

use serde::{Deserialize, Serialize};

/// Status written on every imported book.
pub const STATUS_READY: &str = "ready";

/// One book, as stored in `books.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub intro: String,
    pub chapter_count: usize,
    pub status: String,
}

impl BookRecord {
    pub fn new(book_id: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            book_id: book_id.into(),
            intro: format!("{} (EPUB import)", title),
            title,
            author: String::new(),
            cover_url: String::new(),
            chapter_count: 0,
            status: STATUS_READY.to_string(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = intro.into();
        self
    }

    pub fn with_chapter_count(mut self, count: usize) -> Self {
        self.chapter_count = count;
        self
    }
}

/// One accepted chapter, as stored in `book_chapters.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    pub book_id: String,
    /// 1-based, contiguous across accepted chapters.
    pub chapter_no: usize,
    pub chapter_title: String,
    pub content_html: String,
    pub word_count: usize,
    /// Present only for block-mode extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<usize>,
}

/// A unit of chapter content in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Non-empty, whitespace-collapsed text.
    #[serde(rename = "p")]
    Paragraph { text: String },
    #[serde(rename = "img")]
    Image { src: String, alt: String },
}
