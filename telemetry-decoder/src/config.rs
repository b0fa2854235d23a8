//! Analyzer configuration types
//!
//! This module defines the minimal configuration needed by the decoder library.
//! Panel layouts, chart styling and output locations belong to the application layer.

use crate::formats::EncodingChoice;
use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Top-level field holding the message discriminator
    #[serde(default = "default_type_field")]
    pub type_field: String,

    /// Top-level field holding the record timestamp
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,

    /// Discriminator used for records without one
    #[serde(default = "default_unknown_type")]
    pub unknown_type: String,

    /// How many decode failures are surfaced as warnings (all are counted)
    #[serde(default = "default_max_reported_errors")]
    pub max_reported_errors: usize,

    /// Log a progress line every this many input lines
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Input text encoding
    #[serde(default)]
    pub encoding: EncodingChoice,
}

fn default_type_field() -> String {
    "messageContentType".to_string()
}

fn default_timestamp_field() -> String {
    "timestamp".to_string()
}

fn default_unknown_type() -> String {
    "UNKNOWN".to_string()
}

fn default_max_reported_errors() -> usize {
    3
}

fn default_progress_interval() -> usize {
    10_000
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            type_field: default_type_field(),
            timestamp_field: default_timestamp_field(),
            unknown_type: default_unknown_type(),
            max_reported_errors: default_max_reported_errors(),
            progress_interval: default_progress_interval(),
            encoding: EncodingChoice::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Create a new analyzer configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the discriminator field
    pub fn with_type_field(mut self, field: impl Into<String>) -> Self {
        self.type_field = field.into();
        self
    }

    /// Builder method: set the timestamp field
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = field.into();
        self
    }

    /// Builder method: set the input encoding
    pub fn with_encoding(mut self, encoding: EncodingChoice) -> Self {
        self.encoding = encoding;
        self
    }

    /// Builder method: set how many decode failures are reported
    pub fn with_max_reported_errors(mut self, count: usize) -> Self {
        self.max_reported_errors = count;
        self
    }

    /// Builder method: set the progress logging interval (0 disables it)
    pub fn with_progress_interval(mut self, lines: usize) -> Self {
        self.progress_interval = lines;
        self
    }

    /// Discriminator of a record, falling back to `unknown_type`
    pub fn message_type_of(&self, record: &crate::types::Record) -> String {
        match record.get(&self.type_field) {
            None | Some(serde_json::Value::Null) => self.unknown_type.clone(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analyzer_config_defaults() {
        let config = AnalyzerConfig::new();
        assert_eq!(config.type_field, "messageContentType");
        assert_eq!(config.timestamp_field, "timestamp");
        assert_eq!(config.unknown_type, "UNKNOWN");
        assert_eq!(config.max_reported_errors, 3);
        assert_eq!(config.encoding, EncodingChoice::Auto);
    }

    #[test]
    fn test_analyzer_config_builder() {
        let config = AnalyzerConfig::new()
            .with_type_field("kind")
            .with_timestamp_field("ts")
            .with_encoding(EncodingChoice::Utf16Le)
            .with_max_reported_errors(10)
            .with_progress_interval(0);

        assert_eq!(config.type_field, "kind");
        assert_eq!(config.timestamp_field, "ts");
        assert_eq!(config.encoding, EncodingChoice::Utf16Le);
        assert_eq!(config.max_reported_errors, 10);
        assert_eq!(config.progress_interval, 0);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AnalyzerConfig = serde_json::from_str(r#"{"type_field": "kind"}"#).unwrap();
        assert_eq!(config.type_field, "kind");
        assert_eq!(config.timestamp_field, "timestamp");
    }

    #[test]
    fn test_message_type_of() {
        let config = AnalyzerConfig::new();
        assert_eq!(config.message_type_of(&json!({"messageContentType": "A"})), "A");
        assert_eq!(config.message_type_of(&json!({"other": 1})), "UNKNOWN");
        assert_eq!(config.message_type_of(&json!({"messageContentType": null})), "UNKNOWN");
        assert_eq!(config.message_type_of(&json!({"messageContentType": 7})), "7");
    }
}
