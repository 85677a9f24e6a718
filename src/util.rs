//! Chapter byte decoding.

use encoding_rs::{Encoding, GB18030, UTF_8, UTF_16BE, UTF_16LE};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Result of decoding a chapter document.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    /// The encoding that produced `text`.
    pub encoding: &'static Encoding,
    /// True when no strict decoding succeeded and undecodable bytes were
    /// replaced with U+FFFD.
    pub lossy: bool,
}

/// Decode chapter bytes to a string.
///
/// Candidates are tried strictly, in order, and the first one that decodes
/// without error wins:
///
/// 1. UTF-8
/// 2. UTF-8 with a byte order mark
/// 3. GB18030
/// 4. UTF-16 (byte order from the BOM, little-endian without one)
///
/// If every candidate fails, the bytes are decoded as UTF-8 with replacement
/// characters, so this function never fails.
///
/// # Examples
///
/// ```
/// use epubseed::util::decode_chapter;
///
/// let decoded = decode_chapter("<p>Hello</p>".as_bytes());
/// assert_eq!(decoded.text, "<p>Hello</p>");
/// assert!(!decoded.lossy);
/// ```
pub fn decode_chapter(bytes: &[u8]) -> DecodedText {
    if !bytes.starts_with(UTF8_BOM)
        && let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
    {
        return strict(text.into_owned(), UTF_8);
    }

    if let Some(rest) = bytes.strip_prefix(UTF8_BOM)
        && let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(rest)
    {
        return strict(text.into_owned(), UTF_8);
    }

    if let Some(text) = GB18030.decode_without_bom_handling_and_without_replacement(bytes) {
        return strict(text.into_owned(), GB18030);
    }

    let (utf16, payload) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (UTF_16BE, rest),
        [0xFF, 0xFE, rest @ ..] => (UTF_16LE, rest),
        _ => (UTF_16LE, bytes),
    };
    if let Some(text) = utf16.decode_without_bom_handling_and_without_replacement(payload) {
        return strict(text.into_owned(), utf16);
    }

    let (text, _) = UTF_8.decode_with_bom_removal(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: UTF_8,
        lossy: true,
    }
}

fn strict(text: String, encoding: &'static Encoding) -> DecodedText {
    DecodedText {
        text,
        encoding,
        lossy: false,
    }
}
