//! JSON Lines parser
//!
//! Splits decoded text into lines and parses each non-blank line as one JSON value.
//! Blank lines are skipped without producing an item; malformed lines produce an
//! `Err` item so the caller can count them and keep going.

use crate::formats::encoding::{read_text, EncodingChoice};
use crate::types::{DecoderError, Record, Result};
use std::path::Path;

/// Parse one line. `Ok(None)` for blank lines.
pub fn parse_line(line_number: usize, line: &str) -> Result<Option<Record>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(line)
        .map(Some)
        .map_err(|source| DecoderError::Decode {
            line: line_number,
            source,
        })
}

/// JSON Lines file parser
pub struct JsonLinesParser;

impl JsonLinesParser {
    /// Read and decode a file, returning an iterator over its lines
    pub fn parse(path: &Path, encoding: EncodingChoice) -> Result<JsonLinesIterator> {
        log::info!("Loading JSONL file: {:?}", path);

        if !path.exists() {
            return Err(DecoderError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("JSONL file not found: {:?}", path),
            )));
        }

        let (text, detected) = read_text(path, encoding)?;
        log::debug!("Decoded {:?} as {}", path, detected.name());

        Ok(JsonLinesIterator::new(text))
    }
}

/// Iterator over the parse results of each non-blank line
pub struct JsonLinesIterator {
    text: String,
    position: usize,
    line_number: usize,
}

impl JsonLinesIterator {
    pub fn new(text: String) -> Self {
        Self {
            text,
            position: 0,
            line_number: 0,
        }
    }

    /// Number of physical lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line_number
    }
}

impl Iterator for JsonLinesIterator {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.position >= self.text.len() {
                return None;
            }

            let rest = &self.text[self.position..];
            let (line, advance) = match rest.find('\n') {
                Some(end) => (&rest[..end], end + 1),
                None => (rest, rest.len()),
            };

            self.position += advance;
            self.line_number += 1;

            match parse_line(self.line_number, line) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
