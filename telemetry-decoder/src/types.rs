//! Core types for the telemetry decoder library
//!
//! This module defines the fundamental types produced while processing JSON Lines
//! telemetry logs. Records themselves are plain `serde_json::Value` trees; everything
//! extracted from them is expressed with the types below.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// A decoded input line (arbitrary nested JSON)
pub type Record = serde_json::Value;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that can occur during decoding and analysis
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Invalid JSON on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Field not found: {0}")]
    MissingField(String),

    #[error("Unrecognized timestamp: {0}")]
    TimestampParse(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Scalar value extracted from a record
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Native JSON boolean
    Boolean(bool),
    /// Integral JSON number
    Integer(i64),
    /// Any other JSON number
    Float(f64),
    /// JSON string
    Text(String),
    /// Nested object or array found at the end of a path
    Compound(serde_json::Value),
}

impl FieldValue {
    /// Convert a resolved JSON value. `null` maps to `None` (absent).
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Null => None,
            Value::Bool(b) => Some(FieldValue::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(FieldValue::Integer(i)),
                None => n.as_f64().map(FieldValue::Float),
            },
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            other => Some(FieldValue::Compound(other.clone())),
        }
    }

    /// Numeric view of the value (booleans are 0/1)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) | FieldValue::Compound(_) => None,
        }
    }

    /// Truthiness of the value, `None` for values with no boolean reading
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v != 0),
            FieldValue::Float(v) => Some(*v != 0.0),
            FieldValue::Text(_) | FieldValue::Compound(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldValue::Integer(_) | FieldValue::Float(_))
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        use FieldValue::*;

        match (self, other) {
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            // Integers and floats compare numerically
            (Integer(_) | Float(_), Integer(_) | Float(_)) => self.as_f64() == other.as_f64(),
            (Text(a), Text(b)) => a == b,
            (Compound(a), Compound(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Boolean(v) => write!(f, "{}", if *v { "True" } else { "False" }),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
            FieldValue::Compound(v) => write!(f, "{}", v),
        }
    }
}

/// One extracted (timestamp, value) pair
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampedValue {
    pub timestamp: Timestamp,
    pub value: FieldValue,
}

impl TimestampedValue {
    pub fn new(timestamp: Timestamp, value: FieldValue) -> Self {
        Self { timestamp, value }
    }
}

/// One output row of a multi-field timeseries
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesPoint {
    /// Row key; unique within a series
    pub timestamp: Timestamp,
    /// Discriminator of the record that created the row
    pub message_type: String,
    /// Column name → value. Columns missing from a row are absent.
    pub values: BTreeMap<String, FieldValue>,
}

impl TimeseriesPoint {
    pub fn new(timestamp: Timestamp, message_type: impl Into<String>) -> Self {
        Self {
            timestamp,
            message_type: message_type.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }
}

/// Value kind of a field, as classified or as hinted by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Boolean,
    Numeric,
    #[serde(alias = "string")]
    Categorical,
    Unknown,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::Numeric => write!(f, "numeric"),
            FieldKind::Categorical => write!(f, "string"),
            FieldKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Parse an absolute timestamp.
///
/// Accepts RFC 3339 (with `Z` or a numeric offset) and naive
/// `YYYY-MM-DD[T ]HH:MM:SS[.fraction]`, which is taken as UTC.
pub fn parse_timestamp(text: &str) -> Result<Timestamp> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(DecoderError::TimestampParse(text.to_string()))
}

/// Read a timestamp field from a record. Non-string values are not timestamps.
pub fn record_timestamp(record: &Record, field: &str) -> Result<Timestamp> {
    match record.get(field) {
        None | Some(serde_json::Value::Null) => Err(DecoderError::MissingField(field.to_string())),
        Some(serde_json::Value::String(s)) if s.is_empty() => {
            Err(DecoderError::MissingField(field.to_string()))
        }
        Some(serde_json::Value::String(s)) => parse_timestamp(s),
        Some(other) => Err(DecoderError::TimestampParse(other.to_string())),
    }
}

/// Format a timestamp in a round-trippable form
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
}
