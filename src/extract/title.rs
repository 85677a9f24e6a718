use crate::html::{Token, Tokenizer, unescape};

/// Elements searched for a chapter title, in priority order.
const TITLE_TAGS: &[&str] = &["h1", "h2", "title"];

/// Title of a chapter document: the text of its first `<h1>`, else its first
/// `<h2>`, else its `<title>`. Empty candidates are ignored.
///
/// ```
/// use epubseed::extract::extract_title;
///
/// let html = "<head><title>Book</title></head><body><h2>Chapter <em>One</em></h2></body>";
/// assert_eq!(extract_title(html), Some("Chapter One".to_string()));
/// assert_eq!(extract_title("<p>no heading</p>"), None);
/// ```
pub fn extract_title(markup: &str) -> Option<String> {
    TITLE_TAGS.iter().find_map(|name| first_element_text(markup, name))
}

/// [`extract_title`], falling back to `"Chapter {chapter_no}"`.
pub fn chapter_title(markup: &str, chapter_no: usize) -> String {
    extract_title(markup).unwrap_or_else(|| format!("Chapter {chapter_no}"))
}

/// Trimmed text of the first `name` element, or `None` if it has none or is
/// never closed.
fn first_element_text(markup: &str, name: &str) -> Option<String> {
    let mut tokens = Tokenizer::new(markup);
    tokens.find(|t| matches!(t, Token::Start(tag) if tag.is(name) && !tag.self_closing))?;

    let mut text = String::new();
    let mut closed = false;
    for token in tokens {
        match token {
            Token::Text(raw) => text.push_str(raw),
            Token::End(end) if end.eq_ignore_ascii_case(name) => {
                closed = true;
                break;
            }
            _ => {}
        }
    }
    if !closed {
        return None;
    }

    let text = unescape(&text).trim().to_string();
    (!text.is_empty()).then_some(text)
}
