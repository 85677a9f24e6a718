//! ASCII-safe JSONL for stores that reject raw non-ASCII input.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{Formatter, Serializer};

use crate::error::{Error, Result};

use super::json::parse_jsonl;

/// Compact formatter that escapes everything outside printable ASCII as
/// `\uXXXX`, with surrogate pairs beyond the BMP.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() && c != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serialize `value` compactly with [`AsciiFormatter`].
///
/// ```
/// use epubseed::export::to_ascii_json;
///
/// let json = to_ascii_json(&serde_json::json!({"t": "caf\u{e9} \u{1f600}"})).unwrap();
/// assert_eq!(json, r#"{"t":"caf\u00e9 \ud83d\ude00"}"#);
/// ```
pub fn to_ascii_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut ser = Serializer::with_formatter(Vec::new(), AsciiFormatter);
    value.serialize(&mut ser)?;
    String::from_utf8(ser.into_inner())
        .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Character substitutions applied to one string field of every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatOptions {
    pub field: String,
    /// `(from, to)` pairs, applied in order.
    pub substitutions: Vec<(String, String)>,
}

impl Default for CompatOptions {
    fn default() -> Self {
        Self {
            field: "chapterTitle".to_string(),
            substitutions: vec![("\u{b7}".to_string(), "-".to_string())],
        }
    }
}

impl CompatOptions {
    /// No substitutions at all.
    pub fn none() -> Self {
        Self {
            substitutions: Vec::new(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_substitution(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.substitutions.push((from.into(), to.into()));
        self
    }

    fn apply(&self, record: &mut Value) {
        let Some(Value::String(text)) = record.get_mut(&self.field) else {
            return;
        };
        for (from, to) in &self.substitutions {
            if !from.is_empty() && text.contains(from.as_str()) {
                *text = text.replace(from.as_str(), to);
            }
        }
    }
}

/// Re-encode JSONL records as ASCII-safe compact lines.
///
/// Blank lines are dropped and key order is kept. Running this on its own
/// output returns the same bytes as long as no substitution target contains
/// a substitution source.
pub fn compat_jsonl(input: &str, options: &CompatOptions) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    for mut record in parse_jsonl(input)? {
        options.apply(&mut record);
        out.push_str(&to_ascii_json(&record)?);
        out.push('\n');
    }
    Ok(out)
}
