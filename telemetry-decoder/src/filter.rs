//! Change and time-window filtering of extracted series

use crate::types::{parse_timestamp, FieldValue, Result, Timestamp, TimestampedValue};

/// Candidate entry before filtering: timestamp or value may be unavailable
pub type RawEntry = (Option<Timestamp>, Option<FieldValue>);

/// Result of a change-filter pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutput {
    pub retained: Vec<TimestampedValue>,
    /// Entries dropped for a missing value or timestamp
    pub missing: usize,
}

/// Drops repeated values when `on_change_only` is set
///
/// The filter is stateful so it can be fed entries one at a time while streaming
/// through a file; [`ChangeFilter::apply`] is the batch form.
#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
    on_change_only: bool,
    last_retained: Option<FieldValue>,
    missing: usize,
}

impl ChangeFilter {
    pub fn new(on_change_only: bool) -> Self {
        Self {
            on_change_only,
            last_retained: None,
            missing: 0,
        }
    }

    /// Feed one entry; returns it when retained
    pub fn push(
        &mut self,
        timestamp: Option<Timestamp>,
        value: Option<FieldValue>,
    ) -> Option<TimestampedValue> {
        let (timestamp, value) = match (timestamp, value) {
            (Some(ts), Some(value)) => (ts, value),
            _ => {
                self.missing += 1;
                return None;
            }
        };

        if self.on_change_only && self.last_retained.as_ref() == Some(&value) {
            return None;
        }

        self.last_retained = Some(value.clone());
        Some(TimestampedValue::new(timestamp, value))
    }

    pub fn missing(&self) -> usize {
        self.missing
    }

    /// Filter a whole sequence in arrival order
    pub fn apply<I>(on_change_only: bool, entries: I) -> FilterOutput
    where
        I: IntoIterator<Item = RawEntry>,
    {
        let mut filter = ChangeFilter::new(on_change_only);
        let retained = entries
            .into_iter()
            .filter_map(|(ts, value)| filter.push(ts, value))
            .collect();

        FilterOutput {
            retained,
            missing: filter.missing(),
        }
    }
}

/// Optional inclusive bounds on timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl TimeWindow {
    pub fn new(from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        Self { from, to }
    }

    /// Unbounded on both sides
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build from optional textual bounds
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self> {
        Ok(Self {
            from: from.map(parse_timestamp).transpose()?,
            to: to.map(parse_timestamp).transpose()?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Both bounds inclusive
    pub fn contains(&self, ts: &Timestamp) -> bool {
        if let Some(from) = &self.from {
            if ts < from {
                return false;
            }
        }
        if let Some(to) = &self.to {
            if ts > to {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, entries: Vec<TimestampedValue>) -> Vec<TimestampedValue> {
        if self.is_unbounded() {
            return entries;
        }
        entries
            .into_iter()
            .filter(|entry| self.contains(&entry.timestamp))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ts(second: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(second)
    }

    fn entries(values: &[Option<i64>]) -> Vec<RawEntry> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (Some(ts(i as i64)), v.map(FieldValue::Integer)))
            .collect()
    }

    fn values_of(output: &[TimestampedValue]) -> Vec<FieldValue> {
        output.iter().map(|e| e.value.clone()).collect()
    }

    #[test]
    fn test_change_only_drops_repeats() {
        let output = ChangeFilter::apply(true, entries(&[Some(1), Some(1), Some(2), Some(2), Some(1)]));
        assert_eq!(
            values_of(&output.retained),
            vec![FieldValue::Integer(1), FieldValue::Integer(2), FieldValue::Integer(1)]
        );
        assert_eq!(output.retained[1].timestamp, ts(2));
        assert_eq!(output.missing, 0);
    }

    #[test]
    fn test_change_off_keeps_everything_present() {
        let output = ChangeFilter::apply(false, entries(&[Some(1), Some(1), None, Some(1)]));
        assert_eq!(output.retained.len(), 3);
        assert_eq!(output.missing, 1);
    }

    #[test]
    fn test_missing_timestamp_is_counted() {
        let raw = vec![
            (None, Some(FieldValue::Boolean(true))),
            (Some(ts(1)), Some(FieldValue::Boolean(true))),
        ];
        let output = ChangeFilter::apply(true, raw);
        assert_eq!(output.retained.len(), 1);
        assert_eq!(output.missing, 1);
    }

    #[test]
    fn test_missing_entries_do_not_reset_change_state() {
        let output = ChangeFilter::apply(true, entries(&[Some(5), None, Some(5), Some(6)]));
        assert_eq!(values_of(&output.retained), vec![FieldValue::Integer(5), FieldValue::Integer(6)]);
        assert_eq!(output.missing, 1);
    }

    #[test]
    fn test_numeric_equality_across_representations() {
        let raw = vec![
            (Some(ts(0)), Some(FieldValue::Integer(1))),
            (Some(ts(1)), Some(FieldValue::Float(1.0))),
        ];
        assert_eq!(ChangeFilter::apply(true, raw).retained.len(), 1);
    }

    #[test]
    fn test_boolean_and_number_are_distinct_changes() {
        let raw = vec![
            (Some(ts(0)), Some(FieldValue::Boolean(true))),
            (Some(ts(1)), Some(FieldValue::Integer(1))),
            (Some(ts(2)), Some(FieldValue::Integer(1))),
            (Some(ts(3)), Some(FieldValue::Boolean(true))),
        ];
        let output = ChangeFilter::apply(true, raw);
        assert_eq!(
            values_of(&output.retained),
            vec![FieldValue::Boolean(true), FieldValue::Integer(1), FieldValue::Boolean(true)]
        );
    }

    #[test]
    fn test_change_filter_is_a_fixed_point() {
        let input = entries(&[Some(3), Some(3), Some(4), None, Some(4), Some(3), Some(3), Some(9)]);
        for mode in [true, false] {
            let once = ChangeFilter::apply(mode, input.clone()).retained;
            let again = ChangeFilter::apply(
                mode,
                once.iter().map(|e| (Some(e.timestamp), Some(e.value.clone()))),
            )
            .retained;
            assert_eq!(once, again);
        }
    }

    #[test]
    fn test_time_window_inclusive_bounds() {
        let series: Vec<TimestampedValue> = (0..6)
            .map(|i| TimestampedValue::new(ts(i), FieldValue::Integer(i)))
            .collect();

        let window = TimeWindow::new(Some(ts(1)), Some(ts(4)));
        let kept = window.apply(series.clone());
        assert_eq!(kept.first().unwrap().timestamp, ts(1));
        assert_eq!(kept.last().unwrap().timestamp, ts(4));
        assert_eq!(kept.len(), 4);

        assert_eq!(TimeWindow::new(Some(ts(3)), None).apply(series.clone()).len(), 3);
        assert_eq!(TimeWindow::new(None, Some(ts(0))).apply(series.clone()).len(), 1);
        assert_eq!(TimeWindow::unbounded().apply(series).len(), 6);
    }

    #[test]
    fn test_time_window_parse() {
        let window = TimeWindow::parse(Some("2026-01-01T00:00:01Z"), None).unwrap();
        assert_eq!(window.from, Some(ts(1)));
        assert!(window.to.is_none());
        assert!(TimeWindow::parse(None, Some("later")).is_err());
    }
}
