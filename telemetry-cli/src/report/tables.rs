//! CSV exports

use anyhow::{Context, Result};
use std::path::Path;
use telemetry_decoder::{format_timestamp, MessageTypeReport, TimeseriesPoint, TimestampedValue};

/// `timestamp,<column>` with one row per point
pub fn write_series_csv(path: &Path, column: &str, points: &[TimestampedValue]) -> Result<()> {
    let mut writer = ::csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;

    writer.write_record(["timestamp", column])?;
    for point in points {
        writer.write_record([format_timestamp(&point.timestamp), point.value.to_string()])?;
    }
    writer.flush()?;

    log::info!("CSV written to: {:?}", path);
    Ok(())
}

/// Per-message-type statistics table
pub fn write_message_type_csv(path: &Path, report: &MessageTypeReport) -> Result<()> {
    let mut writer = ::csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;

    writer.write_record([
        "Message Type",
        "Count",
        "Percentage",
        "Avg Interval (seconds)",
        "Avg Interval",
        "First Appearance",
        "Last Appearance",
    ])?;

    for stats in &report.stats {
        writer.write_record([
            stats.message_type.clone(),
            stats.count.to_string(),
            format!("{:.4}", stats.percentage),
            stats.mean_interval.map(|s| s.to_string()).unwrap_or_default(),
            stats.formatted_interval(),
            stats.first_seen().map(|t| format_timestamp(&t)).unwrap_or_default(),
            stats.last_seen().map(|t| format_timestamp(&t)).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;

    log::info!("Exported analysis to {:?}", path);
    Ok(())
}

/// Full multi-field table: `timestamp,messageContentType,<fields...>`
pub fn write_timeseries_csv(path: &Path, points: &[TimeseriesPoint], fields: &[String]) -> Result<()> {
    let mut writer = ::csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;

    let mut header = vec!["timestamp".to_string(), "messageContentType".to_string()];
    header.extend(fields.iter().cloned());
    writer.write_record(&header)?;

    for point in points {
        let mut row = vec![format_timestamp(&point.timestamp), point.message_type.clone()];
        row.extend(
            fields
                .iter()
                .map(|f| point.get(f).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }
    writer.flush()?;

    log::info!("Exported full dataset to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_decoder::{parse_timestamp, FieldValue, MessageTypeStats};

    #[test]
    fn test_series_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switch.csv");
        let points = vec![
            TimestampedValue::new(
                parse_timestamp("2026-01-26T10:00:00Z").unwrap(),
                FieldValue::Boolean(true),
            ),
            TimestampedValue::new(
                parse_timestamp("2026-01-26T10:00:01.5Z").unwrap(),
                FieldValue::Boolean(false),
            ),
        ];

        write_series_csv(&path, "Switch", &points).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "timestamp,Switch");
        assert_eq!(lines[1], "2026-01-26T10:00:00Z,True");
        assert_eq!(lines[2], "2026-01-26T10:00:01.500Z,False");
    }

    #[test]
    fn test_message_type_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.csv");
        let report = MessageTypeReport {
            total_records: 2,
            missing_timestamps: 0,
            stats: vec![MessageTypeStats::from_timestamps(
                "A".to_string(),
                2,
                2,
                vec![
                    parse_timestamp("2026-01-26T10:00:00Z").unwrap(),
                    parse_timestamp("2026-01-26T10:00:02Z").unwrap(),
                ],
            )],
        };

        write_message_type_csv(&path, &report).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].starts_with("Message Type,Count,Percentage"));
        assert_eq!(
            lines[1],
            "A,2,100.0000,2,2.00 sec,2026-01-26T10:00:00Z,2026-01-26T10:00:02Z"
        );
    }

    #[test]
    fn test_timeseries_csv_leaves_gaps_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.csv");

        let mut point = TimeseriesPoint::new(parse_timestamp("2026-01-26T10:00:00Z").unwrap(), "A");
        point.values.insert("Speed".to_string(), FieldValue::Integer(12));

        write_timeseries_csv(&path, &[point], &["Horn".to_string(), "Speed".to_string()]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "timestamp,messageContentType,Horn,Speed");
        assert_eq!(lines[1], "2026-01-26T10:00:00Z,A,,12");
    }
}
