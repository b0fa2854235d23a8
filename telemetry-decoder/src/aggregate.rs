//! Message-type statistics
//!
//! Groups records by their discriminator and derives, per group: count, share of all
//! records, first/last appearance and the inter-arrival intervals with their mean.

use crate::config::AnalyzerConfig;
use crate::types::{record_timestamp, Record, Timestamp};
use std::collections::HashMap;
use std::fmt;

/// Accumulates records for one pass over a log
#[derive(Debug, Clone)]
pub struct MessageTypeAggregator {
    config: AnalyzerConfig,
    groups: HashMap<String, GroupAccumulator>,
    total_records: usize,
    missing_timestamps: usize,
}

#[derive(Debug, Clone, Default)]
struct GroupAccumulator {
    count: usize,
    timestamps: Vec<Timestamp>,
}

impl MessageTypeAggregator {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            groups: HashMap::new(),
            total_records: 0,
            missing_timestamps: 0,
        }
    }

    /// Count one decoded record
    ///
    /// The count always increments; the timestamp is only recorded when it parses.
    pub fn add(&mut self, record: &Record) {
        self.total_records += 1;

        let message_type = self.config.message_type_of(record);
        let group = self.groups.entry(message_type).or_default();
        group.count += 1;

        match record_timestamp(record, &self.config.timestamp_field) {
            Ok(ts) => group.timestamps.push(ts),
            Err(e) => {
                self.missing_timestamps += 1;
                log::trace!("Record without usable timestamp: {}", e);
            }
        }
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn unique_types(&self) -> usize {
        self.groups.len()
    }

    /// Compute the statistics, ordered by count (descending) then name
    pub fn finish(self) -> MessageTypeReport {
        let total = self.total_records;

        let mut stats: Vec<MessageTypeStats> = self
            .groups
            .into_iter()
            .map(|(message_type, group)| {
                MessageTypeStats::from_timestamps(message_type, group.count, total, group.timestamps)
            })
            .collect();

        stats.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.message_type.cmp(&b.message_type))
        });

        MessageTypeReport {
            total_records: total,
            missing_timestamps: self.missing_timestamps,
            stats,
        }
    }
}

impl<'a> Extend<&'a Record> for MessageTypeAggregator {
    fn extend<I: IntoIterator<Item = &'a Record>>(&mut self, records: I) {
        for record in records {
            self.add(record);
        }
    }
}

/// Final aggregation result
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTypeReport {
    pub total_records: usize,
    /// Records counted without a timestamp (absent or unparseable)
    pub missing_timestamps: usize,
    pub stats: Vec<MessageTypeStats>,
}

impl MessageTypeReport {
    pub fn get(&self, message_type: &str) -> Option<&MessageTypeStats> {
        self.stats.iter().find(|s| s.message_type == message_type)
    }

    /// Most frequent type, if any record was seen
    pub fn most_common(&self) -> Option<&MessageTypeStats> {
        self.stats.first()
    }
}

/// Statistics for one discriminator value
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTypeStats {
    pub message_type: String,
    pub count: usize,
    /// count / total × 100 (0 when total is 0)
    pub percentage: f64,
    /// Sorted ascending
    pub timestamps: Vec<Timestamp>,
    /// Seconds between successive sorted timestamps
    pub intervals: Vec<f64>,
    /// `None` with fewer than two timestamps
    pub mean_interval: Option<f64>,
}

impl MessageTypeStats {
    /// Build stats from a group's raw (unsorted) timestamps
    pub fn from_timestamps(
        message_type: String,
        count: usize,
        total: usize,
        mut timestamps: Vec<Timestamp>,
    ) -> Self {
        timestamps.sort_unstable();

        let intervals: Vec<f64> = timestamps
            .windows(2)
            .map(|pair| duration_seconds(pair[1] - pair[0]))
            .collect();

        let mean_interval = if intervals.is_empty() {
            None
        } else {
            Some(intervals.iter().sum::<f64>() / intervals.len() as f64)
        };

        let percentage = if total > 0 {
            count as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            message_type,
            count,
            percentage,
            timestamps,
            intervals,
            mean_interval,
        }
    }

    pub fn first_seen(&self) -> Option<Timestamp> {
        self.timestamps.first().copied()
    }

    pub fn last_seen(&self) -> Option<Timestamp> {
        self.timestamps.last().copied()
    }

    /// Human readable mean interval ("N/A" when unavailable)
    pub fn formatted_interval(&self) -> String {
        match self.mean_interval {
            Some(seconds) => IntervalDisplay(seconds).to_string(),
            None => "N/A".to_string(),
        }
    }

    /// (timestamp, seconds since the previous appearance) pairs
    pub fn interval_points(&self) -> impl Iterator<Item = (Timestamp, f64)> + '_ {
        self.timestamps
            .iter()
            .skip(1)
            .copied()
            .zip(self.intervals.iter().copied())
    }
}

fn duration_seconds(delta: chrono::Duration) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

/// Picks ms / sec / min / hr for an interval in seconds
pub struct IntervalDisplay(pub f64);

impl fmt::Display for IntervalDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.0;
        if seconds < 1.0 {
            write!(f, "{:.2} ms", seconds * 1000.0)
        } else if seconds < 60.0 {
            write!(f, "{:.2} sec", seconds)
        } else if seconds < 3600.0 {
            write!(f, "{:.2} min", seconds / 60.0)
        } else {
            write!(f, "{:.2} hr", seconds / 3600.0)
        }
    }
}
