//! JSON array and JSONL encoding.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Pretty-print `items` as a JSON array with two-space indentation.
///
/// Non-ASCII characters are written as-is and there is no trailing newline.
pub fn to_json_array_string<T: Serialize>(items: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(items)?)
}

pub fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    fs::write(path, to_json_array_string(items)?)?;
    Ok(())
}

pub fn read_json_array(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// One compact JSON object per line, each line terminated by `\n`.
pub fn to_jsonl_string<T: Serialize>(items: &[T]) -> Result<String> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    Ok(out)
}

pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    fs::write(path, to_jsonl_string(items)?)?;
    Ok(())
}

/// Parse JSONL, skipping blank lines.
pub fn parse_jsonl(input: &str) -> Result<Vec<Value>> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

pub fn read_jsonl(path: &Path) -> Result<Vec<Value>> {
    parse_jsonl(&fs::read_to_string(path)?)
}

/// Fold JSONL back into a pretty JSON array.
pub fn jsonl_to_seed_array(input: &str) -> Result<String> {
    to_json_array_string(&parse_jsonl(input)?)
}
