//! Text encoding detection and decoding
//!
//! Recorded logs come from different exporters: some write UTF-8, some write UTF-16LE
//! with or without a byte-order mark. Detection order:
//! 1. A byte-order mark decides (UTF-8, UTF-16LE, UTF-16BE).
//! 2. Otherwise UTF-16LE and then UTF-8 are probed by parsing the first few lines.
//! 3. Fallback: UTF-8.
//!
//! Decoding is lossy: malformed sequences become U+FFFD instead of failing the file.

use crate::types::{DecoderError, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Number of leading bytes inspected when probing an encoding
const PROBE_BYTES: usize = 64 * 1024;

/// Number of non-empty lines that must parse as JSON for a probe to succeed
const PROBE_LINES: usize = 3;

/// Requested input encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodingChoice {
    /// Detect from BOM and content
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "utf-8")]
    Utf8,
    /// UTF-16 with BOM detection, little-endian when no BOM is present
    #[serde(rename = "utf-16")]
    Utf16,
    #[serde(rename = "utf-16-le")]
    Utf16Le,
    #[serde(rename = "utf-16-be")]
    Utf16Be,
}

impl FromStr for EncodingChoice {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(EncodingChoice::Auto),
            "utf-8" | "utf8" => Ok(EncodingChoice::Utf8),
            "utf-16" | "utf16" => Ok(EncodingChoice::Utf16),
            "utf-16-le" | "utf-16le" | "utf16le" => Ok(EncodingChoice::Utf16Le),
            "utf-16-be" | "utf-16be" | "utf16be" => Ok(EncodingChoice::Utf16Be),
            other => Err(DecoderError::UnsupportedEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for EncodingChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncodingChoice::Auto => "auto",
            EncodingChoice::Utf8 => "utf-8",
            EncodingChoice::Utf16 => "utf-16",
            EncodingChoice::Utf16Le => "utf-16-le",
            EncodingChoice::Utf16Be => "utf-16-be",
        };
        write!(f, "{}", name)
    }
}

/// Pick the encoding for a byte buffer
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        log::info!("Detected encoding: {} (BOM found)", encoding.name());
        return encoding;
    }

    let prefix = &bytes[..bytes.len().min(PROBE_BYTES)];
    let truncated = prefix.len() < bytes.len();

    for candidate in [UTF_16LE, UTF_8] {
        if probe(candidate, prefix, truncated) {
            log::info!("Detected encoding: {}", candidate.name());
            return candidate;
        }
    }

    log::info!("Could not auto-detect encoding, using UTF-8");
    UTF_8
}

/// True when the first non-empty lines decode to valid JSON under `encoding`
fn probe(encoding: &'static Encoding, prefix: &[u8], truncated: bool) -> bool {
    let (text, _) = encoding.decode_without_bom_handling(prefix);

    let mut lines: Vec<&str> = text.split('\n').collect();
    if truncated && lines.len() > 1 {
        // The last segment may have been cut mid-line
        lines.pop();
    }

    let candidates: Vec<&str> = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .take(PROBE_LINES)
        .collect();

    !candidates.is_empty()
        && candidates
            .iter()
            .all(|line| serde_json::from_str::<serde_json::Value>(line).is_ok())
}

/// Decode a whole buffer according to `choice`, stripping any BOM
pub fn decode_bytes(bytes: &[u8], choice: EncodingChoice) -> (String, &'static Encoding) {
    let bom = Encoding::for_bom(bytes);

    let encoding = match choice {
        EncodingChoice::Auto => detect_encoding(bytes),
        EncodingChoice::Utf8 => UTF_8,
        EncodingChoice::Utf16 => match bom {
            Some((enc, _)) if enc == UTF_16BE => UTF_16BE,
            _ => UTF_16LE,
        },
        EncodingChoice::Utf16Le => UTF_16LE,
        EncodingChoice::Utf16Be => UTF_16BE,
    };

    let body = match bom {
        Some((enc, bom_len)) if enc == encoding => &bytes[bom_len..],
        _ => bytes,
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        log::warn!(
            "Input contained byte sequences invalid in {}; they were replaced",
            encoding.name()
        );
    }

    (text.into_owned(), encoding)
}

/// Read a file and decode it to text
pub fn read_text(path: &Path, choice: EncodingChoice) -> Result<(String, &'static Encoding)> {
    let bytes = fs::read(path)?;
    log::debug!("Read {} bytes from {:?}", bytes.len(), path);
    Ok(decode_bytes(&bytes, choice))
}
