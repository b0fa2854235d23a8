//! Telemetry Decoder Library
//!
//! A stateless, reusable library for analysing recorded JSON Lines telemetry logs:
//! one JSON object per line, with a `messageContentType` discriminator and a
//! `timestamp` field.
//!
//! # Architecture
//!
//! This library is intentionally focused on decoding and analysis:
//! - Reads UTF-8 / UTF-16 JSON Lines files, skipping and counting malformed lines
//! - Resolves dotted field paths inside nested records
//! - Classifies fields as boolean, numeric or categorical
//! - Computes per-message-type counts and inter-arrival intervals
//! - Filters series by value change and time window
//! - Downsamples tables without losing state transitions
//!
//! The library does NOT:
//! - Parse command lines or panel configuration files
//! - Write CSV files
//! - Render charts
//!
//! All of that lives in the application layer (telemetry-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use telemetry_decoder::{AnalyzerConfig, Decoder, FieldExtraction, FieldPath, MessageTypeAggregator};
//! use std::path::Path;
//!
//! let config = AnalyzerConfig::new();
//! let decoder = Decoder::new(config.clone());
//!
//! // Message type statistics
//! let mut aggregator = MessageTypeAggregator::new(config.clone());
//! for record in decoder.decode_file(Path::new("export.jsonl")).unwrap() {
//!     aggregator.add(&record);
//! }
//! let report = aggregator.finish();
//! for stats in &report.stats {
//!     println!("{}: {} ({})", stats.message_type, stats.count, stats.formatted_interval());
//! }
//!
//! // One field of one message type, changes only
//! let extraction = FieldExtraction::new(
//!     "RemoteTrainControlTelegram",
//!     FieldPath::parse("message.MessagePayload.SystemControlOverrideSwitchActivated"),
//! )
//! .with_on_change_only(true);
//! let records = decoder.decode_file(Path::new("export.jsonl")).unwrap();
//! let series = extraction.run(records, &config);
//! println!("{} points", series.points.len());
//! ```

// Public modules
pub mod aggregate;
pub mod classify;
pub mod config;
pub mod decoder;
pub mod downsample;
pub mod extract;
pub mod filter;
pub mod formats;
pub mod path;
pub mod timeseries;
pub mod types;

// Re-export main types for convenience
pub use aggregate::{IntervalDisplay, MessageTypeAggregator, MessageTypeReport, MessageTypeStats};
pub use classify::{boolean_level, classify};
pub use config::AnalyzerConfig;
pub use decoder::{DecodeStats, Decoder, RecordStream};
pub use downsample::{forward_fill, Downsampler, DEFAULT_MAX_POINTS};
pub use extract::{ExtractedSeries, ExtractionStats, FieldExtraction};
pub use filter::{ChangeFilter, FilterOutput, TimeWindow};
pub use formats::EncodingChoice;
pub use path::FieldPath;
pub use timeseries::{Timeseries, TimeseriesBuilder, TimeseriesSpec, TimeseriesStats};
pub use types::{
    format_timestamp, parse_timestamp, DecoderError, FieldKind, FieldValue, Record, Result,
    TimeseriesPoint, Timestamp, TimestampedValue,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: decode a couple of lines and aggregate them
        let decoder = Decoder::new(AnalyzerConfig::new());
        let mut aggregator = MessageTypeAggregator::new(AnalyzerConfig::new());
        for record in decoder.decode_str("{\"messageContentType\":\"A\"}\n") {
            aggregator.add(&record);
        }
        assert_eq!(aggregator.finish().total_records, 1);
    }
}
