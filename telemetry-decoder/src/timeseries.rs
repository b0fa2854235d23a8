//! Multi-field timeseries building
//!
//! Several fields, possibly from several message types, are merged into one table with
//! a row per distinct timestamp. Fields are given either as full dotted paths or as
//! bare names that are looked up under a list of common parent paths.

use crate::config::AnalyzerConfig;
use crate::path::FieldPath;
use crate::types::{record_timestamp, DecoderError, Record, Result, TimeseriesPoint, Timestamp};
use std::collections::{BTreeMap, BTreeSet};

/// Parent paths searched, in order, for bare field names
pub const DEFAULT_SEARCH_PREFIXES: [&str; 4] = [
    "message.MessagePayload",
    "message.OutsideControlData",
    "message",
    "message.ActiveCabInfo",
];

/// Selection of records and fields for a timeseries
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesSpec {
    /// A record passes when any filter is a substring of its discriminator.
    /// No filters means every record passes.
    pub message_types: Vec<String>,
    pub field_paths: Vec<FieldPath>,
    pub field_names: Vec<String>,
    pub search_prefixes: Vec<FieldPath>,
}

impl Default for TimeseriesSpec {
    fn default() -> Self {
        Self {
            message_types: Vec::new(),
            field_paths: Vec::new(),
            field_names: Vec::new(),
            search_prefixes: DEFAULT_SEARCH_PREFIXES
                .iter()
                .map(|p| FieldPath::parse(p))
                .collect(),
        }
    }
}

impl TimeseriesSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a message type filter
    pub fn add_message_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_types.push(message_type.into());
        self
    }

    /// Builder method: add a full field path
    pub fn add_field_path(mut self, path: FieldPath) -> Self {
        self.field_paths.push(path);
        self
    }

    /// Builder method: add a bare field name
    pub fn add_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_names.push(name.into());
        self
    }

    /// Builder method: replace the search prefixes for bare names
    pub fn with_search_prefixes(mut self, prefixes: Vec<FieldPath>) -> Self {
        self.search_prefixes = prefixes;
        self
    }

    /// At least one field or field path is required
    pub fn validate(&self) -> Result<()> {
        if self.field_paths.is_empty() && self.field_names.is_empty() {
            return Err(DecoderError::Configuration(
                "no fields specified; give at least one field name or field path".to_string(),
            ));
        }
        Ok(())
    }

    fn accepts(&self, message_type: &str) -> bool {
        self.message_types.is_empty()
            || self
                .message_types
                .iter()
                .any(|filter| message_type.contains(filter.as_str()))
    }
}

/// Merges extracted values into one row per timestamp
#[derive(Debug, Clone)]
pub struct TimeseriesBuilder {
    spec: TimeseriesSpec,
    config: AnalyzerConfig,
    /// Bare names with their candidate full paths, resolved once
    name_paths: Vec<(String, Vec<FieldPath>)>,
    rows: BTreeMap<Timestamp, TimeseriesPoint>,
    fields_found: BTreeSet<String>,
    stats: TimeseriesStats,
}

/// Counters for a timeseries build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeseriesStats {
    /// Decoded records seen
    pub total: usize,
    /// Records passing the message type filter
    pub matched: usize,
    /// Matched records without a usable timestamp
    pub missing_timestamps: usize,
}

impl TimeseriesBuilder {
    pub fn new(spec: TimeseriesSpec, config: AnalyzerConfig) -> Result<Self> {
        spec.validate()?;

        let name_paths = spec
            .field_names
            .iter()
            .map(|name| {
                let candidates = spec.search_prefixes.iter().map(|p| p.join(name)).collect();
                (name.clone(), candidates)
            })
            .collect();

        Ok(Self {
            spec,
            config,
            name_paths,
            rows: BTreeMap::new(),
            fields_found: BTreeSet::new(),
            stats: TimeseriesStats::default(),
        })
    }

    /// Merge one record into the table
    pub fn add(&mut self, record: &Record) {
        self.stats.total += 1;

        if !record.is_object() {
            return;
        }

        let message_type = self.config.message_type_of(record);
        if !self.spec.accepts(&message_type) {
            return;
        }
        self.stats.matched += 1;

        let timestamp = match record_timestamp(record, &self.config.timestamp_field) {
            Ok(ts) => ts,
            Err(_) => {
                self.stats.missing_timestamps += 1;
                return;
            }
        };

        let row = self
            .rows
            .entry(timestamp)
            .or_insert_with(|| TimeseriesPoint::new(timestamp, message_type));

        for path in &self.spec.field_paths {
            if let Some(value) = path.extract(record) {
                let name = path.leaf().to_string();
                self.fields_found.insert(name.clone());
                row.values.insert(name, value);
            }
        }

        for (name, candidates) in &self.name_paths {
            if let Some(value) = candidates.iter().find_map(|path| path.extract(record)) {
                self.fields_found.insert(name.clone());
                row.values.insert(name.clone(), value);
            }
        }
    }

    pub fn stats(&self) -> TimeseriesStats {
        self.stats
    }

    /// Rows in ascending timestamp order
    pub fn finish(self) -> Timeseries {
        log::info!(
            "Extracted {} rows from {} matching records ({} without timestamp)",
            self.rows.len(),
            self.stats.matched,
            self.stats.missing_timestamps
        );

        Timeseries {
            points: self.rows.into_values().collect(),
            fields: self.fields_found.into_iter().collect(),
            stats: self.stats,
        }
    }
}

impl<'a> Extend<&'a Record> for TimeseriesBuilder {
    fn extend<I: IntoIterator<Item = &'a Record>>(&mut self, records: I) {
        for record in records {
            self.add(record);
        }
    }
}

/// Built table
#[derive(Debug, Clone, PartialEq)]
pub struct Timeseries {
    /// Ascending, one row per timestamp
    pub points: Vec<TimeseriesPoint>,
    /// Sorted names of fields found at least once
    pub fields: Vec<String>,
    pub stats: TimeseriesStats,
}

impl Timeseries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn time_range(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.points.first()?.timestamp, self.points.last()?.timestamp))
    }

    /// Non-absent values of one column
    pub fn column_values<'a>(
        points: &'a [TimeseriesPoint],
        column: &'a str,
    ) -> impl Iterator<Item = &'a crate::types::FieldValue> + 'a {
        points.iter().filter_map(move |p| p.get(column))
    }
}
