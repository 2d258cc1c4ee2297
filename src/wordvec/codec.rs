//! Serialized centroid representation stored alongside each document.
//!
//! Each entry renders as `label c0 c1 ... cd` (space-delimited); entries are
//! joined with `:`. The optional byte layer compresses the rendered string
//! with lz4 so large collections keep the stored field small.

use crate::wordvec::types::WordVec;
use lz4_flex::block::DecompressError;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use thiserror::Error;

/// Separator between serialized centroid entries.
const ENTRY_SEPARATOR: char = ':';

/// Errors from parsing a stored centroid payload.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Empty centroid entry at position {0}")]
    EmptyEntry(usize),

    #[error("Invalid coordinate '{value}' in entry '{label}'")]
    InvalidCoordinate { label: String, value: String },

    #[error("Stored payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Failed to decompress stored payload: {0}")]
    Decompress(#[from] DecompressError),
}

/// Renders vectors into the delimited stored form.
#[must_use]
pub fn encode(entries: &[WordVec]) -> String {
    entries
        .iter()
        .map(|wv| {
            let mut s = String::from(wv.word());
            for c in wv.coords() {
                s.push(' ');
                s.push_str(&c.to_string());
            }
            s
        })
        .collect::<Vec<_>>()
        .join(&ENTRY_SEPARATOR.to_string())
}

/// Parses the delimited stored form back into vectors.
pub fn decode(payload: &str) -> Result<Vec<WordVec>, CodecError> {
    let mut entries = Vec::new();

    for (i, part) in payload
        .split(ENTRY_SEPARATOR)
        .filter(|p| !p.trim().is_empty())
        .enumerate()
    {
        let mut fields = part.split_whitespace();
        let label = fields.next().ok_or(CodecError::EmptyEntry(i))?;
        let mut coords = Vec::new();
        for field in fields {
            let value = field.parse::<f32>().map_err(|_| CodecError::InvalidCoordinate {
                label: label.to_string(),
                value: field.to_string(),
            })?;
            coords.push(value);
        }
        if coords.is_empty() {
            return Err(CodecError::EmptyEntry(i));
        }
        entries.push(WordVec::new(label, coords));
    }

    Ok(entries)
}

/// Compresses a rendered payload for the stored bytes field.
#[must_use]
pub fn compress(payload: &str) -> Vec<u8> {
    compress_prepend_size(payload.as_bytes())
}

/// Decompresses a stored bytes field back into the rendered payload.
pub fn decompress(bytes: &[u8]) -> Result<String, CodecError> {
    let raw = decompress_size_prepended(bytes)?;
    Ok(std::str::from_utf8(&raw)?.to_string())
}
