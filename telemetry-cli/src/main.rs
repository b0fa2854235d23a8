//! Telemetry Analyzer CLI Application
//!
//! Command-line interface for analysing JSON Lines telemetry exports.
//! It uses the telemetry-decoder library and adds:
//! - Message type statistics (CSV + HTML table/charts)
//! - Multi-field timeseries with transition-preserving downsampling
//! - Single-field extraction to CSV
//! - Config-driven panel grids, extracted in parallel

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use telemetry_decoder::{
    classify, AnalyzerConfig, DecodeStats, Decoder, Downsampler, EncodingChoice, FieldExtraction,
    FieldKind, FieldPath, MessageTypeAggregator, TimeWindow, Timeseries, TimeseriesBuilder,
    TimeseriesSpec, DEFAULT_MAX_POINTS,
};

mod config;
mod panels;
mod report;

use report::{base_filename, html, output_path, tables};

/// Telemetry Analyzer - Explore recorded JSON Lines telemetry logs
#[derive(Parser, Debug)]
#[command(name = "telemetry-cli")]
#[command(about = "Analyze JSON Lines telemetry exports", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count message types and their inter-arrival intervals
    MessageTypes {
        /// JSON Lines file to analyze
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Directory for CSV and HTML outputs
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Input encoding (auto, utf-8, utf-16, utf-16-le, utf-16-be)
        #[arg(long, default_value = "auto")]
        encoding: EncodingChoice,
    },

    /// Build a multi-field timeseries and plot it
    Timeseries {
        /// JSON Lines file to analyze
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Message types to include (substring match)
        #[arg(long, num_args = 1..)]
        message_types: Vec<String>,

        /// Field names searched under the common payload prefixes
        #[arg(long, num_args = 1..)]
        fields: Vec<String>,

        /// Explicit dotted field paths
        #[arg(long, num_args = 1..)]
        field_paths: Vec<String>,

        /// Maximum number of plotted points
        #[arg(long, default_value_t = DEFAULT_MAX_POINTS)]
        max_points: usize,

        /// Directory for CSV and HTML outputs
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Skip the processed data CSV
        #[arg(long)]
        no_csv: bool,

        /// Smaller chart: no markers, no range slider
        #[arg(long)]
        lightweight: bool,

        /// Input encoding (auto, utf-8, utf-16, utf-16-le, utf-16-be)
        #[arg(long, default_value = "auto")]
        encoding: EncodingChoice,
    },

    /// Extract one field of one message type
    Extract {
        /// JSON Lines file to analyze
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dotted path of the field (e.g. message.MessagePayload.Speed)
        #[arg(long)]
        field_path: String,

        /// Exact message type to match
        #[arg(long)]
        message_type: String,

        /// Keep only value changes
        #[arg(long)]
        on_change_only: bool,

        /// Inclusive lower time bound
        #[arg(long, value_name = "TIMESTAMP")]
        from: Option<String>,

        /// Inclusive upper time bound
        #[arg(long, value_name = "TIMESTAMP")]
        to: Option<String>,

        /// Directory for CSV and HTML outputs
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Input encoding (auto, utf-8, utf-16, utf-16-le, utf-16-be)
        #[arg(long, default_value = "auto")]
        encoding: EncodingChoice,
    },

    /// Render a grid of panels described by a config file
    Panels {
        /// Panel configuration (TOML or JSON)
        #[arg(value_name = "CONFIG", default_value = config::DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Telemetry Analyzer CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", telemetry_decoder::VERSION);

    match args.command {
        Command::MessageTypes {
            file,
            output_dir,
            encoding,
        } => message_types_mode(&file, &output_dir, encoding),
        Command::Timeseries {
            file,
            message_types,
            fields,
            field_paths,
            max_points,
            output_dir,
            no_csv,
            lightweight,
            encoding,
        } => {
            let mut spec = TimeseriesSpec::new();
            for message_type in message_types {
                spec = spec.add_message_type(message_type);
            }
            for name in fields {
                spec = spec.add_field_name(name);
            }
            for path in field_paths {
                spec = spec.add_field_path(FieldPath::parse(&path));
            }
            let options = TimeseriesOptions {
                max_points,
                write_csv: !no_csv,
                lightweight,
            };
            timeseries_mode(&file, spec, &options, &output_dir, encoding)
        }
        Command::Extract {
            file,
            field_path,
            message_type,
            on_change_only,
            from,
            to,
            output_dir,
            encoding,
        } => {
            let window = TimeWindow::parse(from.as_deref(), to.as_deref())
                .context("Invalid time window")?;
            let extraction = FieldExtraction::new(message_type, FieldPath::parse(&field_path))
                .with_on_change_only(on_change_only)
                .with_window(window);
            extract_mode(&file, &extraction, &output_dir, encoding)
        }
        Command::Panels { config } => panels_mode(&config),
    }
}

/// Lines the decoder skipped, one summary line per counter
fn decode_summary(stats: &DecodeStats) -> Vec<String> {
    vec![
        format!("  Invalid lines:    {}", stats.invalid_lines),
        format!("  Non-object lines: {}", stats.non_object),
    ]
}

fn print_decode_summary(stats: &DecodeStats) {
    for line in decode_summary(stats) {
        println!("{}", line);
    }
}

fn prepare_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory: {:?}", dir))
}

/// Message type statistics: CSV, table, bar chart and interval scatter
fn message_types_mode(file: &Path, output_dir: &Path, encoding: EncodingChoice) -> Result<()> {
    println!("═══════════════════════════════════════════════");
    println!("  Telemetry Analyzer - Message Types");
    println!("═══════════════════════════════════════════════\n");

    let config = AnalyzerConfig::new().with_encoding(encoding);
    let decoder = Decoder::new(config.clone());
    let mut records = decoder
        .decode_file(file)
        .with_context(|| format!("Failed to open log file: {:?}", file))?;
    prepare_output_dir(output_dir)?;

    let mut aggregator = MessageTypeAggregator::new(config);
    for record in records.by_ref() {
        aggregator.add(&record);
    }
    let decode_stats = records.stats();
    let report = aggregator.finish();

    println!("📄 File: {:?}", file);
    println!("  Lines read:    {}", decode_stats.lines_read);
    println!("  Records:       {}", report.total_records);
    print_decode_summary(&decode_stats);
    println!("  No timestamp:  {}", report.missing_timestamps);
    println!("  Message types: {}\n", report.stats.len());

    for stats in &report.stats {
        println!(
            "  {:<40} {:>8} {:>7.2}%  {}",
            stats.message_type,
            stats.count,
            stats.percentage,
            stats.formatted_interval()
        );
    }

    if let Some(top) = report.most_common() {
        println!("\nMost common: {} ({} records)", top.message_type, top.count);
    }

    let base = base_filename(file);
    tables::write_message_type_csv(
        &output_path(output_dir, &base, "message_type_analysis.csv"),
        &report,
    )?;
    html::message_type_table(&report, &base).write_html(
        &output_path(output_dir, &base, "message_type_table.html"),
        "Message Type Table",
    )?;
    html::message_type_bar(&report, &base).write_html(
        &output_path(output_dir, &base, "message_type_chart.html"),
        "Message Type Counts",
    )?;
    html::message_type_scatter(&report, &base).write_html(
        &output_path(output_dir, &base, "message_type_scatter.html"),
        "Message Type Intervals",
    )?;

    println!("\n✓ Outputs written to {:?}", output_dir);
    Ok(())
}

struct TimeseriesOptions {
    max_points: usize,
    write_csv: bool,
    lightweight: bool,
}

/// Multi-field timeseries: processed CSV plus chart
fn timeseries_mode(
    file: &Path,
    spec: TimeseriesSpec,
    options: &TimeseriesOptions,
    output_dir: &Path,
    encoding: EncodingChoice,
) -> Result<()> {
    println!("═══════════════════════════════════════════════");
    println!("  Telemetry Analyzer - Timeseries");
    println!("═══════════════════════════════════════════════\n");

    let config = AnalyzerConfig::new().with_encoding(encoding);
    let mut builder = TimeseriesBuilder::new(spec, config.clone())?;
    let decoder = Decoder::new(config);
    let mut records = decoder
        .decode_file(file)
        .with_context(|| format!("Failed to open log file: {:?}", file))?;
    prepare_output_dir(output_dir)?;

    for record in records.by_ref() {
        builder.add(&record);
    }
    let decode_stats = records.stats();
    let table = builder.finish();

    println!("📄 File: {:?}", file);
    println!("  Records:            {}", table.stats.total);
    println!("  Matched:            {}", table.stats.matched);
    print_decode_summary(&decode_stats);
    println!("  Missing timestamps: {}", table.stats.missing_timestamps);
    println!("  Rows:               {}", table.points.len());
    println!("  Fields:             {}", table.fields.join(", "));

    let Some((start, end)) = table.time_range() else {
        log::warn!("No data found for the requested fields");
        println!("\n⚠️  No data found");
        return Ok(());
    };
    println!("  Time range:         {} → {}", start, end);

    let base = base_filename(file);
    if options.write_csv {
        tables::write_timeseries_csv(
            &output_path(output_dir, &base, "processed_data.csv"),
            &table.points,
            &table.fields,
        )?;
    }

    let kinds = field_kinds(&table);
    for (name, kind) in &kinds {
        log::info!("Field {} classified as {}", name, kind);
        if *kind == FieldKind::Unknown {
            log::warn!("Field {} has mixed or non-scalar values and is not plotted", name);
        }
    }

    let tracked: Vec<String> = kinds
        .iter()
        .filter(|(_, kind)| *kind != FieldKind::Unknown)
        .map(|(name, _)| name.clone())
        .collect();
    let sampled = Downsampler::new(options.max_points).apply(&table.points, &tracked);
    if sampled.len() < table.points.len() {
        println!(
            "  Downsampled:        {} → {} points",
            table.points.len(),
            sampled.len()
        );
    }

    html::timeseries_chart(&sampled, &kinds, &base, options.lightweight).write_html(
        &output_path(output_dir, &base, "timeseries.html"),
        &format!("Telemetry Data: {}", base),
    )?;

    println!("\n✓ Outputs written to {:?}", output_dir);
    Ok(())
}

fn field_kinds(table: &Timeseries) -> Vec<(String, FieldKind)> {
    table
        .fields
        .iter()
        .map(|name| {
            let kind = classify(Timeseries::column_values(&table.points, name));
            (name.clone(), kind)
        })
        .collect()
}

/// One field of one message type to `<stem>_<leaf>.csv` plus a step chart
fn extract_mode(
    file: &Path,
    extraction: &FieldExtraction,
    output_dir: &Path,
    encoding: EncodingChoice,
) -> Result<()> {
    let config = AnalyzerConfig::new().with_encoding(encoding);
    let decoder = Decoder::new(config.clone());
    let mut records = decoder
        .decode_file(file)
        .with_context(|| format!("Failed to open log file: {:?}", file))?;
    prepare_output_dir(output_dir)?;

    let series = extraction.run(records.by_ref(), &config);
    let decode_stats = records.stats();

    println!("📄 File: {:?}", file);
    println!("  Records:          {}", series.stats.total);
    print_decode_summary(&decode_stats);
    println!("  Matched type:     {}", series.stats.matched);
    println!("  Used:             {}", series.stats.used);
    println!("  Missing/invalid:  {}", series.stats.missing);

    let base = format!("{}_{}", base_filename(file), series.name());
    let csv_path = output_dir.join(format!("{}.csv", base));
    tables::write_series_csv(&csv_path, series.name(), &series.points)?;

    let kind = classify(series.values());
    let title = format!("{} / {}", extraction.message_type, extraction.path);
    html::series_chart(&series.points, kind, series.name(), &title)
        .write_html(&output_dir.join(format!("{}.html", base)), &title)?;

    println!("\n✓ Saved {:?}", csv_path);
    Ok(())
}

/// Config-driven panel grid
fn panels_mode(config_path: &Path) -> Result<()> {
    println!("═══════════════════════════════════════════════");
    println!("  Telemetry Analyzer - Panels");
    println!("═══════════════════════════════════════════════\n");

    log::info!("Loading configuration from: {:?}", config_path);
    let panels_config = config::load_config(config_path)?;
    let layout = panels_config
        .validate()
        .with_context(|| format!("Invalid configuration: {:?}", config_path))?;
    log::debug!("Configuration loaded successfully");

    println!(
        "✓ Configuration loaded: {} panels in a {}x{} grid",
        layout.panels.len(),
        layout.rows,
        layout.columns
    );

    let results = panels::extract_panels(&layout, &AnalyzerConfig::new())?;

    for result in &results {
        println!(
            "  [{}] {} / {}: {} points ({} matched, {} missing)",
            result.panel.index,
            result.panel.extraction.message_type,
            result.panel.extraction.path,
            result.series.points.len(),
            result.series.stats.matched,
            result.series.stats.missing
        );
        if result.decode_stats.invalid_lines > 0 || result.decode_stats.non_object > 0 {
            println!(
                "      Skipped: {} invalid lines, {} non-object lines",
                result.decode_stats.invalid_lines, result.decode_stats.non_object
            );
        }
        if let Some(path) = &result.csv_path {
            println!("      CSV: {:?}", path);
        }
    }

    let title = layout.title.clone().unwrap_or_else(|| "Panels".to_string());
    html::panel_grid(&layout, &results).write_html(&layout.output_file, &title)?;

    println!("\n✓ Chart saved as {:?}", layout.output_file);
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
