//! Panel grid processing
//!
//! Every panel is an independent extraction task. Tasks run on the rayon pool, each
//! decoding its own source file and writing its own CSV. Rendering starts only after
//! all tasks have finished.

use crate::config::{Panel, PanelLayout};
use crate::report::tables;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::PathBuf;
use telemetry_decoder::{AnalyzerConfig, DecodeStats, Decoder, ExtractedSeries};

/// Outcome of one panel's extraction
#[derive(Debug, Clone)]
pub struct PanelResult {
    pub panel: Panel,
    pub series: ExtractedSeries,
    pub decode_stats: DecodeStats,
    pub csv_path: Option<PathBuf>,
}

/// Extract every panel in parallel; results keep panel order
pub fn extract_panels(layout: &PanelLayout, config: &AnalyzerConfig) -> Result<Vec<PanelResult>> {
    let config = config.clone().with_encoding(layout.encoding);

    layout
        .panels
        .par_iter()
        .map(|panel| extract_panel(panel, layout, &config))
        .collect()
}

fn extract_panel(panel: &Panel, layout: &PanelLayout, config: &AnalyzerConfig) -> Result<PanelResult> {
    log::info!(
        "Panel {}: extracting {} from {} in {:?}",
        panel.index,
        panel.extraction.path,
        panel.extraction.message_type,
        panel.source_file
    );

    let decoder = Decoder::new(config.clone());
    let mut records = decoder
        .decode_file(&panel.source_file)
        .with_context(|| format!("Panel {}: failed to open {:?}", panel.index, panel.source_file))?;

    let series = panel.extraction.run(records.by_ref(), config);
    let decode_stats = records.stats();

    if decode_stats.non_object > 0 {
        log::warn!(
            "Panel {}: skipped {} non-object lines",
            panel.index,
            decode_stats.non_object
        );
    }
    if decode_stats.invalid_lines > 0 {
        log::warn!(
            "Panel {}: skipped {} invalid lines",
            panel.index,
            decode_stats.invalid_lines
        );
    }

    let csv_path = match &panel.csv_name {
        Some(name) => {
            let path = layout.data_path.join(format!("{}.csv", name));
            tables::write_series_csv(&path, series.name(), &series.points)?;
            Some(path)
        }
        None => None,
    };

    Ok(PanelResult {
        panel: panel.clone(),
        series,
        decode_stats,
        csv_path,
    })
}
