//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct turns a JSON Lines log into a stream of records, skipping and
//! counting lines that are not valid JSON.

use crate::config::AnalyzerConfig;
use crate::formats::{JsonLinesIterator, JsonLinesParser};
use crate::types::{Record, Result};
use std::path::Path;

/// The main decoder struct - entry point for reading telemetry logs
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: AnalyzerConfig,
}

impl Decoder {
    /// Create a new decoder instance
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Decode a log file and return a stream of records
    ///
    /// Fails only when the file cannot be read. Malformed lines are skipped; the
    /// stream keeps a count of them in its [`DecodeStats`].
    ///
    /// # Example
    /// ```no_run
    /// use telemetry_decoder::{AnalyzerConfig, Decoder};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new(AnalyzerConfig::new());
    /// let mut records = decoder.decode_file(Path::new("export.jsonl")).unwrap();
    ///
    /// for record in records.by_ref() {
    ///     println!("{}", record["messageContentType"]);
    /// }
    /// println!("skipped {} lines", records.stats().invalid_lines);
    /// ```
    pub fn decode_file(&self, path: &Path) -> Result<RecordStream> {
        let lines = JsonLinesParser::parse(path, self.config.encoding)?;
        Ok(RecordStream::new(lines, &self.config))
    }

    /// Decode already loaded text
    pub fn decode_str(&self, text: &str) -> RecordStream {
        RecordStream::new(JsonLinesIterator::new(text.to_string()), &self.config)
    }
}

/// Counters kept while decoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Physical lines consumed, including blank ones
    pub lines_read: usize,
    /// Successfully decoded records
    pub records: usize,
    /// Lines that were not valid JSON
    pub invalid_lines: usize,
    /// Decoded records that are not JSON objects
    pub non_object: usize,
}

/// Iterator over decoded records
///
/// Decode failures are absorbed here: the first few are logged as warnings and
/// every one is counted.
pub struct RecordStream {
    lines: JsonLinesIterator,
    stats: DecodeStats,
    max_reported_errors: usize,
    progress_interval: usize,
    next_progress: usize,
}

impl RecordStream {
    fn new(lines: JsonLinesIterator, config: &AnalyzerConfig) -> Self {
        Self {
            lines,
            stats: DecodeStats::default(),
            max_reported_errors: config.max_reported_errors,
            progress_interval: config.progress_interval,
            next_progress: config.progress_interval,
        }
    }

    /// Counters so far (final once the stream is exhausted)
    pub fn stats(&self) -> DecodeStats {
        DecodeStats {
            lines_read: self.lines.lines_read(),
            ..self.stats
        }
    }

    fn report_progress(&mut self) {
        if self.progress_interval == 0 {
            return;
        }
        let lines_read = self.lines.lines_read();
        if lines_read >= self.next_progress {
            log::debug!(
                "Processed {} lines ({} records, {} invalid)",
                lines_read,
                self.stats.records,
                self.stats.invalid_lines
            );
            self.next_progress = lines_read + self.progress_interval;
        }
    }
}

impl Iterator for RecordStream {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.lines.next()?;
            self.report_progress();

            match item {
                Ok(record) => {
                    self.stats.records += 1;
                    if !record.is_object() {
                        self.stats.non_object += 1;
                    }
                    return Some(record);
                }
                Err(e) => {
                    self.stats.invalid_lines += 1;
                    if self.stats.invalid_lines <= self.max_reported_errors {
                        log::warn!("Skipping invalid JSON: {}", e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_str_counts_invalid_lines() {
        let decoder = Decoder::new(AnalyzerConfig::new());
        let text = "{\"a\":1}\nnot json\n\n[1,2]\n{\"a\":2}\n{oops\n";

        let mut stream = decoder.decode_str(text);
        let records: Vec<Record> = stream.by_ref().collect();

        assert_eq!(records.len(), 3);
        let stats = stream.stats();
        assert_eq!(stats.records, 3);
        assert_eq!(stats.invalid_lines, 2);
        assert_eq!(stats.non_object, 1);
        assert_eq!(stats.lines_read, 6);
    }

    #[test]
    fn test_decode_missing_file() {
        let decoder = Decoder::default();
        assert!(decoder.decode_file(Path::new("does-not-exist.jsonl")).is_err());
    }
}
