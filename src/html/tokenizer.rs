//! Minimal streaming tag tokenizer for chapter markup.
//!
//! This is not an HTML parser: it never builds a tree and never validates.
//! It splits markup into text runs, start tags and end tags, which is all
//! the extractor needs. Comments, doctypes, processing instructions and CDATA
//! markers are skipped. `script` and `style` elements are consumed whole and
//! never surface as tokens.

use std::borrow::Cow;

use memchr::memchr;

use super::unescape;

/// A single markup token borrowing from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Raw text; entities are not yet unescaped.
    Text(&'a str),
    Start(Tag<'a>),
    /// End tag name as written.
    End(&'a str),
}

/// A start tag with its raw attribute region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub name: &'a str,
    attrs: &'a str,
    pub self_closing: bool,
}

impl<'a> Tag<'a> {
    /// Case-insensitive tag name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Look up an attribute (case-insensitive) and unescape its value.
    ///
    /// Attributes without a value yield an empty string.
    pub fn attr(&self, name: &str) -> Option<Cow<'a, str>> {
        Attributes { rest: self.attrs }
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| unescape(value))
    }
}

/// Iterator over `(name, raw value)` pairs of an attribute region.
struct Attributes<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Attributes<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let s = self.rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if s.is_empty() {
            self.rest = s;
            return None;
        }

        let name_end = s
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(s.len());
        let name = &s[..name_end];
        let after_name = s[name_end..].trim_start_matches(|c: char| c.is_ascii_whitespace());

        let Some(value_part) = after_name.strip_prefix('=') else {
            self.rest = after_name;
            return Some((name, ""));
        };
        let value_part = value_part.trim_start_matches(|c: char| c.is_ascii_whitespace());

        let (value, rest) = match value_part.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &value_part[1..];
                match body.find(quote) {
                    Some(end) => (&body[..end], &body[end + 1..]),
                    None => (body, ""),
                }
            }
            _ => {
                let end = value_part
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(value_part.len());
                (&value_part[..end], &value_part[end..])
            }
        };

        self.rest = rest;
        Some((name, value))
    }
}

/// Streaming tokenizer over a markup string.
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Emit `src[pos..end]` as text and move to `end`.
    fn text_until(&mut self, end: usize) -> Token<'a> {
        let text = &self.src[self.pos..end];
        self.pos = end;
        Token::Text(text)
    }

    /// Skip past the next occurrence of `terminator`, or to the end of input.
    fn skip_past(&mut self, from: usize, terminator: &str) {
        self.pos = match self.src[from..].find(terminator) {
            Some(i) => from + i + terminator.len(),
            None => self.src.len(),
        };
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let src = self.src;
            let bytes = src.as_bytes();
            if self.pos >= bytes.len() {
                return None;
            }

            let lt = match memchr(b'<', &bytes[self.pos..]) {
                Some(0) => self.pos,
                Some(i) => return Some(self.text_until(self.pos + i)),
                None => return Some(self.text_until(bytes.len())),
            };

            let rest = &src[lt + 1..];
            if rest.starts_with("!--") {
                self.skip_past(lt + 4, "-->");
                continue;
            }
            if rest.starts_with('!') || rest.starts_with('?') {
                self.skip_past(lt + 1, ">");
                continue;
            }

            if let Some(after_slash) = rest.strip_prefix('/') {
                let name_len = tag_name_len(after_slash);
                if name_len == 0 {
                    // `</>` or `</ 3`: not a tag
                    return Some(self.text_until(lt + 1));
                }
                let name = &after_slash[..name_len];
                self.skip_past(lt + 2 + name_len, ">");
                return Some(Token::End(name));
            }

            let name_len = tag_name_len(rest);
            if name_len == 0 {
                // A bare '<' in text, e.g. "a < b"
                return Some(self.text_until(lt + 1));
            }
            let name = &rest[..name_len];
            let attrs_start = lt + 1 + name_len;

            let Some(close) = find_tag_end(&bytes[attrs_start..]) else {
                // Unterminated tag at end of input: drop it.
                self.pos = bytes.len();
                return None;
            };
            let gt = attrs_start + close;
            let inner = &src[attrs_start..gt];
            let self_closing = inner.trim_end().ends_with('/');
            self.pos = gt + 1;

            if !self_closing && (name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style")) {
                self.pos = match find_end_tag(src, self.pos, name) {
                    Some(end) => end,
                    None => bytes.len(),
                };
                continue;
            }

            return Some(Token::Start(Tag {
                name,
                attrs: inner,
                self_closing,
            }));
        }
    }
}

/// Length of a tag name at the start of `s` (letter, then name characters).
fn tag_name_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        return 0;
    }
    bytes
        .iter()
        .position(|&b| !(b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')))
        .unwrap_or(bytes.len())
}

/// Position of the `>` closing a tag, skipping quoted attribute values.
fn find_tag_end(bytes: &[u8]) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i),
            None => {}
        }
    }
    None
}

/// Byte offset just past `</name ...>` starting the search at `from`.
fn find_end_tag(src: &str, from: usize, name: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut pos = from;
    while let Some(i) = memchr(b'<', &bytes[pos..]) {
        let lt = pos + i;
        let candidate = &bytes[lt + 1..];
        if candidate.first() == Some(&b'/')
            && candidate.len() > name.len()
            && candidate[1..=name.len()].eq_ignore_ascii_case(name.as_bytes())
            && !candidate
                .get(name.len() + 1)
                .is_some_and(|b| b.is_ascii_alphanumeric())
        {
            return Some(match memchr(b'>', &bytes[lt..]) {
                Some(gt) => lt + gt + 1,
                None => bytes.len(),
            });
        }
        pos = lt + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token<'_>> {
        Tokenizer::new(src).collect()
    }

    fn start<'a>(name: &'a str, attrs: &'a str, self_closing: bool) -> Token<'a> {
        Token::Start(Tag {
            name,
            attrs,
            self_closing,
        })
    }

    #[test]
    fn test_simple_markup() {
        assert_eq!(
            tokens("<p class=\"x\">Hello <b>world</b></p>"),
            vec![
                start("p", " class=\"x\"", false),
                Token::Text("Hello "),
                start("b", "", false),
                Token::Text("world"),
                Token::End("b"),
                Token::End("p"),
            ]
        );
    }

    #[test]
    fn test_self_closing() {
        let toks = tokens("a<br/>b<img src='x.png' />");
        assert_eq!(toks[0], Token::Text("a"));
        assert_eq!(toks[1], start("br", "/", true));
        assert_eq!(toks[2], Token::Text("b"));
        match toks[3] {
            Token::Start(tag) => {
                assert!(tag.is("IMG"));
                assert!(tag.self_closing);
                assert_eq!(tag.attr("src").as_deref(), Some("x.png"));
            }
            other => panic!("expected img start tag, got {other:?}"),
        }
    }

    #[test]
    fn test_script_and_style_are_consumed() {
        assert_eq!(
            tokens("a<script>if (a < b) { x = '</p>'; }</script>b<STYLE type=\"text/css\">p{}</Style >c"),
            vec![Token::Text("a"), Token::Text("b"), Token::Text("c")]
        );
    }

    #[test]
    fn test_unclosed_script_consumes_rest() {
        assert_eq!(tokens("a<script>var x;"), vec![Token::Text("a")]);
    }

    #[test]
    fn test_comments_and_declarations_skipped() {
        assert_eq!(
            tokens("<?xml version=\"1.0\"?><!DOCTYPE html><!-- <p>hidden</p> -->x"),
            vec![Token::Text("x")]
        );
    }

    #[test]
    fn test_bare_less_than_is_text() {
        let text: String = tokens("a < b <3")
            .into_iter()
            .map(|t| match t {
                Token::Text(s) => s,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(text, "a < b <3");
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        let toks = tokens("<img alt=\"a > b\" src=x.png>t");
        match toks[0] {
            Token::Start(tag) => {
                assert_eq!(tag.attr("alt").as_deref(), Some("a > b"));
                assert_eq!(tag.attr("src").as_deref(), Some("x.png"));
            }
            other => panic!("expected start tag, got {other:?}"),
        }
        assert_eq!(toks[1], Token::Text("t"));
    }

    #[test]
    fn test_unterminated_tag_dropped() {
        assert_eq!(tokens("text<p class=\"x"), vec![Token::Text("text")]);
    }

    #[test]
    fn test_attribute_forms() {
        let toks = tokens("<input disabled value=a&amp;b data-x = 'y' ALT=\"&quot;q&quot;\">");
        let Token::Start(tag) = toks[0] else {
            panic!("expected start tag");
        };
        assert_eq!(tag.attr("disabled").as_deref(), Some(""));
        assert_eq!(tag.attr("value").as_deref(), Some("a&b"));
        assert_eq!(tag.attr("data-x").as_deref(), Some("y"));
        assert_eq!(tag.attr("alt").as_deref(), Some("\"q\""));
        assert_eq!(tag.attr("missing"), None);
    }

    #[test]
    fn test_namespaced_and_multibyte() {
        assert_eq!(
            tokens("<svg:image/>\u{4f60}\u{597d}</svg:image>"),
            vec![
                start("svg:image", "/", true),
                Token::Text("\u{4f60}\u{597d}"),
                Token::End("svg:image"),
            ]
        );
    }
}
