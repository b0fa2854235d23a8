//! Input file handling
//!
//! Telemetry logs are JSON Lines files in UTF-8 or UTF-16. This module turns a file on
//! disk into text (`encoding`) and text into a stream of per-line parse results (`jsonl`).

pub mod encoding;
pub mod jsonl;

pub use encoding::{decode_bytes, detect_encoding, read_text, EncodingChoice};
pub use jsonl::{parse_line, JsonLinesIterator, JsonLinesParser};
