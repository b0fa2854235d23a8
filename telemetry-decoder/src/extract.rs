//! Single-field extraction
//!
//! One extraction pulls one field of one message type out of a log:
//! type match → path resolution → change filter (arrival order) → time window →
//! stable sort by timestamp. Each extraction owns all of its state, so several can
//! run in parallel over the same file.

use crate::config::AnalyzerConfig;
use crate::filter::{ChangeFilter, TimeWindow};
use crate::path::FieldPath;
use crate::types::{record_timestamp, FieldValue, Record, TimestampedValue};

/// Matched-record interval between progress log lines
const PROGRESS_INTERVAL: usize = 50_000;

/// What to extract
#[derive(Debug, Clone, PartialEq)]
pub struct FieldExtraction {
    /// Label used in log lines
    pub label: String,
    /// Exact discriminator value to match
    pub message_type: String,
    pub path: FieldPath,
    pub on_change_only: bool,
    pub window: TimeWindow,
}

impl FieldExtraction {
    pub fn new(message_type: impl Into<String>, path: FieldPath) -> Self {
        Self {
            label: path.leaf().to_string(),
            message_type: message_type.into(),
            path,
            on_change_only: false,
            window: TimeWindow::unbounded(),
        }
    }

    /// Builder method: set the log label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Builder method: only keep value changes
    pub fn with_on_change_only(mut self, enabled: bool) -> Self {
        self.on_change_only = enabled;
        self
    }

    /// Builder method: restrict to a time window
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Run over a record stream
    pub fn run<I>(&self, records: I, config: &AnalyzerConfig) -> ExtractedSeries
    where
        I: IntoIterator<Item = Record>,
    {
        log::info!(
            "[{}] Extracting {} from {} messages",
            self.label,
            self.path,
            self.message_type
        );

        let mut stats = ExtractionStats::default();
        let mut filter = ChangeFilter::new(self.on_change_only);
        let mut retained = Vec::new();

        for record in records {
            stats.total += 1;

            if !record.is_object() {
                continue;
            }
            if config.message_type_of(&record) != self.message_type {
                continue;
            }

            stats.matched += 1;
            if stats.matched % PROGRESS_INTERVAL == 0 {
                log::info!(
                    "[{}] Matched {} records (total read {})...",
                    self.label,
                    stats.matched,
                    stats.total
                );
            }

            let timestamp = record_timestamp(&record, &config.timestamp_field).ok();
            let value = self.path.extract(&record);

            if let Some(entry) = filter.push(timestamp, value) {
                retained.push(entry);
            }
        }

        stats.missing = filter.missing();

        let mut points = self.window.apply(retained);
        points.sort_by_key(|entry| entry.timestamp);
        stats.used = points.len();

        log::info!(
            "[{}] Total read: {}, matched type: {}, used: {}, missing/invalid: {}",
            self.label,
            stats.total,
            stats.matched,
            stats.used,
            stats.missing
        );
        if points.is_empty() {
            log::warn!(
                "[{}] No data points found. Check the field path and message type.",
                self.label
            );
        }

        ExtractedSeries {
            path: self.path.clone(),
            points,
            stats,
        }
    }
}

/// Counters for one extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Decoded records seen
    pub total: usize,
    /// Records of the requested message type
    pub matched: usize,
    /// Points in the final series
    pub used: usize,
    /// Matched records without a value or a usable timestamp
    pub missing: usize,
}

/// Output of one extraction, sorted by timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSeries {
    pub path: FieldPath,
    pub points: Vec<TimestampedValue>,
    pub stats: ExtractionStats,
}

impl ExtractedSeries {
    /// Column name of the series
    pub fn name(&self) -> &str {
        self.path.leaf()
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.points.iter().map(|p| &p.value)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_timestamp;
    use serde_json::json;

    fn telegram(ts: &str, switch: serde_json::Value) -> Record {
        json!({
            "messageContentType": "RemoteTrainControlTelegram",
            "timestamp": ts,
            "message": {"MessagePayload": {"Switch": switch}}
        })
    }

    fn records() -> Vec<Record> {
        vec![
            telegram("2026-01-01T00:00:03Z", json!(true)),
            telegram("2026-01-01T00:00:01Z", json!(false)),
            json!({"messageContentType": "Other", "timestamp": "2026-01-01T00:00:02Z"}),
            telegram("2026-01-01T00:00:04Z", json!(true)),
            telegram("2026-01-01T00:00:05Z", json!(null)),
            telegram("not a time", json!(false)),
            json!([1, 2]),
            telegram("2026-01-01T00:00:06Z", json!(false)),
        ]
    }

    fn extraction() -> FieldExtraction {
        FieldExtraction::new(
            "RemoteTrainControlTelegram",
            FieldPath::parse("message.MessagePayload.Switch"),
        )
    }

    #[test]
    fn test_extract_counts_and_sorts() {
        let series = extraction().run(records(), &AnalyzerConfig::new());

        assert_eq!(series.stats.total, 8);
        assert_eq!(series.stats.matched, 6);
        assert_eq!(series.stats.missing, 2);
        assert_eq!(series.stats.used, 4);
        assert_eq!(series.name(), "Switch");

        let times: Vec<_> = series.points.iter().map(|p| p.timestamp).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }

    #[test]
    fn test_extract_on_change_only_uses_arrival_order() {
        let series = extraction()
            .with_on_change_only(true)
            .run(records(), &AnalyzerConfig::new());

        // Arrival order: true, false, true, (null), (bad ts), false → true, false, true, false
        assert_eq!(series.points.len(), 4);

        let repeated = vec![
            telegram("2026-01-01T00:00:01Z", json!(true)),
            telegram("2026-01-01T00:00:02Z", json!(true)),
            telegram("2026-01-01T00:00:03Z", json!(false)),
        ];
        let series = extraction()
            .with_on_change_only(true)
            .run(repeated, &AnalyzerConfig::new());
        assert_eq!(series.points.len(), 2);
    }

    #[test]
    fn test_extract_with_window() {
        let window = TimeWindow::new(
            Some(parse_timestamp("2026-01-01T00:00:03Z").unwrap()),
            Some(parse_timestamp("2026-01-01T00:00:04Z").unwrap()),
        );
        let series = extraction().with_window(window).run(records(), &AnalyzerConfig::new());

        assert_eq!(series.stats.used, 2);
        assert!(series.values().all(|v| *v == FieldValue::Boolean(true)));
    }

    #[test]
    fn test_extract_no_match() {
        let series = FieldExtraction::new("Nope", FieldPath::parse("a"))
            .run(records(), &AnalyzerConfig::new());
        assert!(series.is_empty());
        assert_eq!(series.stats.matched, 0);
    }
}
