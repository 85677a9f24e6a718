//! Markup handling: a streaming tag tokenizer and character references.

mod entities;
mod tokenizer;

pub use entities::{escape, unescape};
pub use tokenizer::{Tag, Token, Tokenizer};

/// Drop all markup from `html`, keeping unescaped text content.
///
/// ```
/// use epubseed::html::strip_tags;
///
/// assert_eq!(strip_tags("<p>Fish &amp; <em>chips</em></p>"), "Fish & chips");
/// ```
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    for token in Tokenizer::new(html) {
        if let Token::Text(raw) = token {
            text.push_str(&unescape(raw));
        }
    }
    text
}
