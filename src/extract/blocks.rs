use crate::book::ContentBlock;
use crate::error::Result;
use crate::html::{Token, escape, unescape};

use super::{body_tokens, clean_line};

/// Elements whose boundaries end a paragraph.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "section", "article",
    "header", "footer", "pre",
];

fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(name))
}

/// Maps an `<img src>` value to the URI written into the output.
///
/// Returning `Ok(None)` drops the image.
pub trait ImageResolver {
    fn resolve(&mut self, src: &str) -> Result<Option<String>>;
}

impl<F> ImageResolver for F
where
    F: FnMut(&str) -> Result<Option<String>>,
{
    fn resolve(&mut self, src: &str) -> Result<Option<String>> {
        self(src)
    }
}

/// Paragraph and image blocks of one chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterBlocks {
    pub blocks: Vec<ContentBlock>,
    pub image_count: usize,
}

impl ChapterBlocks {
    /// Sum of paragraph lengths in characters.
    pub fn text_char_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| match block {
                ContentBlock::Paragraph { text } => text.chars().count(),
                ContentBlock::Image { .. } => 0,
            })
            .sum()
    }

    /// Render blocks as the record's `contentHtml`.
    pub fn to_content_html(&self) -> String {
        if self.blocks.is_empty() {
            return "<p>(No content)</p>".to_string();
        }

        let mut out = String::new();
        for block in &self.blocks {
            match block {
                ContentBlock::Paragraph { text } => {
                    out.push_str("<p>");
                    out.push_str(&escape(text));
                    out.push_str("</p>");
                }
                ContentBlock::Image { src, alt } => {
                    out.push_str(&format!(
                        "<p><img src=\"{}\" alt=\"{}\" /></p>",
                        escape(src),
                        escape(alt)
                    ));
                }
            }
        }
        out
    }
}

/// Accumulates text between block boundaries into paragraph blocks.
pub struct BlockBuilder<I> {
    images: I,
    pending: String,
    out: ChapterBlocks,
}

impl<I: ImageResolver> BlockBuilder<I> {
    pub fn new(images: I) -> Self {
        Self {
            images,
            pending: String::new(),
            out: ChapterBlocks::default(),
        }
    }

    pub fn feed<'a>(&mut self, tokens: impl IntoIterator<Item = Token<'a>>) -> Result<()> {
        for token in tokens {
            match token {
                Token::Text(raw) => self.pending.push_str(&unescape(raw)),
                Token::Start(tag) if is_block_tag(tag.name) => self.flush(),
                Token::Start(tag) if tag.is("br") => self.pending.push('\n'),
                Token::Start(tag) if tag.is("img") => {
                    self.flush();
                    let raw_src = tag.attr("src").unwrap_or_default();
                    if let Some(src) = self.images.resolve(&raw_src)?
                        && !src.is_empty()
                    {
                        let alt = tag.attr("alt").unwrap_or_default().trim().to_string();
                        self.out.blocks.push(ContentBlock::Image { src, alt });
                        self.out.image_count += 1;
                    }
                }
                Token::End(name) if is_block_tag(name) => self.flush(),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> ChapterBlocks {
        self.flush();
        self.out
    }

    fn flush(&mut self) {
        if let Some(text) = clean_line(&self.pending) {
            self.out.blocks.push(ContentBlock::Paragraph { text });
        }
        self.pending.clear();
    }
}

/// Extract paragraph and image blocks from a chapter's markup.
pub fn extract_blocks<I: ImageResolver>(markup: &str, images: I) -> Result<ChapterBlocks> {
    let mut builder = BlockBuilder::new(images);
    builder.feed(body_tokens(markup))?;
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_images(_: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn paragraphs(blocks: &ChapterBlocks) -> Vec<&str> {
        blocks
            .blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Paragraph { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_paragraph_boundaries() {
        let html = "<body><h1>Title</h1><p>First   para\n with <em>inline</em> text.</p>\
                    <div>Second<br/>line</div>Tail text<ul><li>Item</li></ul></body>";
        let blocks = extract_blocks(html, no_images).unwrap();
        assert_eq!(
            paragraphs(&blocks),
            vec!["Title", "First para with inline text.", "Second line", "Tail text", "Item"]
        );
        assert_eq!(blocks.image_count, 0);
    }

    #[test]
    fn test_boilerplate_and_entities() {
        let html = "<p>Cover Page</p><p>@page { margin: 0 }</p><p>Fish &amp; chips&hellip;</p>";
        let blocks = extract_blocks(html, no_images).unwrap();
        assert_eq!(paragraphs(&blocks), vec!["Fish & chips\u{2026}"]);
    }

    #[test]
    fn test_html5_references_decoded() {
        let blocks = extract_blocks("<p>&Ograve;dd &copy 2020 &hearts;</p>", no_images).unwrap();
        assert_eq!(paragraphs(&blocks), vec!["\u{d2}dd \u{a9} 2020 \u{2665}"]);
    }

    #[test]
    fn test_script_and_style_ignored() {
        let html = "<body><style>p { color: red }</style><p>Text</p><script>alert('x')</script></body>";
        let blocks = extract_blocks(html, no_images).unwrap();
        assert_eq!(paragraphs(&blocks), vec!["Text"]);
    }

    #[test]
    fn test_images_flush_pending_text() {
        let mut seen = Vec::new();
        let resolver = |src: &str| -> Result<Option<String>> {
            seen.push(src.to_string());
            Ok(match src {
                "missing.png" => None,
                other => Some(format!("seedasset://{other}")),
            })
        };

        let html = "<p>Before<img src=\"a.png\" alt=\" A figure \"/>After</p><img src=\"missing.png\">";
        let blocks = extract_blocks(html, resolver).unwrap();

        assert_eq!(
            blocks.blocks,
            vec![
                ContentBlock::Paragraph { text: "Before".into() },
                ContentBlock::Image {
                    src: "seedasset://a.png".into(),
                    alt: "A figure".into(),
                },
                ContentBlock::Paragraph { text: "After".into() },
            ]
        );
        assert_eq!(blocks.image_count, 1);
        assert_eq!(seen, vec!["a.png", "missing.png"]);
    }

    #[test]
    fn test_resolver_error_propagates() {
        let failing = |_: &str| -> Result<Option<String>> {
            Err(crate::error::Error::InvalidEpub("boom".into()))
        };
        assert!(extract_blocks("<img src=\"x.png\">", failing).is_err());
    }

    #[test]
    fn test_text_char_count() {
        let blocks = extract_blocks("<p>abc</p><p>\u{4f60}\u{597d}</p>", no_images).unwrap();
        assert_eq!(blocks.text_char_count(), 5);
    }

    #[test]
    fn test_content_html() {
        let blocks = ChapterBlocks {
            blocks: vec![
                ContentBlock::Paragraph {
                    text: "a < b & \"c\"".into(),
                },
                ContentBlock::Image {
                    src: "seedasset://x.png".into(),
                    alt: "it's".into(),
                },
            ],
            image_count: 1,
        };
        assert_eq!(
            blocks.to_content_html(),
            "<p>a &lt; b &amp; &quot;c&quot;</p><p><img src=\"seedasset://x.png\" alt=\"it&#x27;s\" /></p>"
        );
        assert_eq!(ChapterBlocks::default().to_content_html(), "<p>(No content)</p>");
    }
}
