// End-to-end checks over real files: decode → aggregate / extract / build → downsample
use std::io::Write;
use telemetry_decoder::{
    classify, AnalyzerConfig, Decoder, Downsampler, EncodingChoice, FieldExtraction, FieldKind,
    FieldPath, FieldValue, MessageTypeAggregator, TimeseriesBuilder, TimeseriesSpec,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_log(lines: &[String]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

fn telegram_lines() -> Vec<String> {
    let mut lines = Vec::new();
    for i in 0..10 {
        let switch = (3..6).contains(&i);
        lines.push(format!(
            r#"{{"messageContentType":"Telegram","timestamp":"2026-01-26T10:00:{:02}Z","message":{{"MessagePayload":{{"Switch":{},"Speed":{}}}}}}}"#,
            i,
            switch,
            i * 10
        ));
    }
    lines.push(r#"{"messageContentType":"Status","timestamp":"2026-01-26T10:00:00.500Z"}"#.to_string());
    lines.push(String::new());
    lines.push("{truncated".to_string());
    lines.push(r#"{"timestamp":"2026-01-26T10:00:01Z"}"#.to_string());
    lines
}

#[test]
fn aggregate_message_types_from_file() {
    init_logger();
    let file = write_log(&telegram_lines());
    let config = AnalyzerConfig::new();
    let decoder = Decoder::new(config.clone());

    let mut stream = decoder.decode_file(file.path()).unwrap();
    let mut aggregator = MessageTypeAggregator::new(config);
    for record in stream.by_ref() {
        aggregator.add(&record);
    }
    let decode_stats = stream.stats();
    let report = aggregator.finish();

    assert_eq!(decode_stats.invalid_lines, 1);
    assert_eq!(report.total_records, 12);
    assert_eq!(report.stats.iter().map(|s| s.count).sum::<usize>(), 12);

    let telegram = report.get("Telegram").unwrap();
    assert_eq!(telegram.count, 10);
    assert_eq!(telegram.mean_interval, Some(1.0));
    assert_eq!(report.get("UNKNOWN").unwrap().count, 1);
    assert_eq!(report.get("Status").unwrap().mean_interval, None);
}

#[test]
fn extract_boolean_changes_from_file() {
    init_logger();
    let file = write_log(&telegram_lines());
    let config = AnalyzerConfig::new();
    let records = Decoder::new(config.clone()).decode_file(file.path()).unwrap();

    let series = FieldExtraction::new("Telegram", FieldPath::parse("message.MessagePayload.Switch"))
        .with_on_change_only(true)
        .run(records, &config);

    let values: Vec<&FieldValue> = series.values().collect();
    assert_eq!(
        values,
        vec![
            &FieldValue::Boolean(false),
            &FieldValue::Boolean(true),
            &FieldValue::Boolean(false)
        ]
    );
    assert_eq!(classify(series.values()), FieldKind::Boolean);
}

#[test]
fn timeseries_downsampling_keeps_transitions() {
    init_logger();
    let file = write_log(&telegram_lines());
    let config = AnalyzerConfig::new();
    let decoder = Decoder::new(config.clone());

    let spec = TimeseriesSpec::new()
        .add_message_type("Telegram")
        .add_field_name("Switch")
        .add_field_name("Speed");
    let mut builder = TimeseriesBuilder::new(spec, config).unwrap();
    for record in decoder.decode_file(file.path()).unwrap() {
        builder.add(&record);
    }
    let table = builder.finish();
    assert_eq!(table.points.len(), 10);

    let tracked = vec!["Switch".to_string()];
    let sampled = Downsampler::new(4).apply(&table.points, &tracked);

    let kept: Vec<_> = sampled.iter().map(|p| p.timestamp).collect();
    for index in [0, 2, 3, 5, 6, 9] {
        assert!(kept.contains(&table.points[index].timestamp), "index {} dropped", index);
    }
}

#[test]
fn utf16_input_is_detected() {
    init_logger();
    let text = telegram_lines().join("\n");
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();

    let config = AnalyzerConfig::new().with_encoding(EncodingChoice::Auto);
    let mut stream = Decoder::new(config).decode_file(file.path()).unwrap();
    let count = stream.by_ref().count();

    assert_eq!(count, 12);
    assert_eq!(stream.stats().invalid_lines, 1);
}
