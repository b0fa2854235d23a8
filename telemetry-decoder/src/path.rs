//! Dotted field paths
//!
//! A `FieldPath` such as `message.MessagePayload.Speed` addresses a value inside a
//! nested record. Resolution is total: it returns the value or `None`, never a partial
//! result and never an error.

use crate::types::{FieldValue, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered path segments into a nested record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Build from a dotted string (`"a.b.c"`)
    pub fn parse(dotted: &str) -> Self {
        Self {
            segments: dotted.split('.').map(str::to_string).collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment; used as the column name for extracted values
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// A new path with `segment` appended
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(segment.split('.').map(str::to_string));
        Self { segments }
    }

    /// Walk the record. Any missing key or non-object intermediate yields `None`.
    pub fn resolve<'a>(&self, record: &'a Record) -> Option<&'a Record> {
        self.segments
            .iter()
            .try_fold(record, |current, segment| current.as_object()?.get(segment))
    }

    /// Resolve and convert to a scalar; JSON `null` counts as absent
    pub fn extract(&self, record: &Record) -> Option<FieldValue> {
        self.resolve(record).and_then(FieldValue::from_json)
    }
}

impl From<String> for FieldPath {
    fn from(dotted: String) -> Self {
        FieldPath::parse(&dotted)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(FieldPath::parse(s))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
