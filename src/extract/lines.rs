use crate::html::{Token, escape, unescape};

use super::{body_tokens, clean_line};

/// Cleaned text lines of one chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterLines {
    pub lines: Vec<String>,
}

impl ChapterLines {
    /// Number of non-whitespace characters across all lines.
    pub fn char_count(&self) -> usize {
        self.lines
            .iter()
            .flat_map(|line| line.chars())
            .filter(|c| !c.is_whitespace())
            .count()
    }

    pub fn to_content_html(&self) -> String {
        if self.lines.is_empty() {
            return "<p>(No content)</p>".to_string();
        }
        self.lines
            .iter()
            .map(|line| format!("<p>{}</p>", escape(line)))
            .collect()
    }
}

/// Flatten a chapter's markup into cleaned lines.
///
/// `<br>` and `</p>` become line breaks; every other tag is removed without
/// leaving a separator.
pub fn extract_lines(markup: &str) -> ChapterLines {
    let mut text = String::with_capacity(markup.len() / 2);
    for token in body_tokens(markup) {
        match token {
            Token::Text(raw) => text.push_str(&unescape(raw)),
            Token::Start(tag) if tag.is("br") => text.push('\n'),
            Token::End(name) if name.eq_ignore_ascii_case("p") => text.push('\n'),
            _ => {}
        }
    }

    ChapterLines {
        lines: text.lines().filter_map(clean_line).collect(),
    }
}
