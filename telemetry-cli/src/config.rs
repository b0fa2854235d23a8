//! Panel configuration loading and validation
//!
//! A panel file describes a grid of charts. Each axis entry extracts one field of one
//! message type from one source file. TOML and JSON are both accepted; field names
//! may be snake_case or camelCase.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use telemetry_decoder::{EncodingChoice, FieldExtraction, FieldKind, FieldPath, TimeWindow};

/// Default panel configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Main panel configuration (loaded from config.toml / config.json)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PanelsConfig {
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub title: Option<String>,
    pub xlabel: Option<String>,
    /// Directory holding source files; CSVs and the chart are written here too
    #[serde(default = "default_data_path", alias = "dataPath")]
    pub data_path: PathBuf,
    #[serde(default = "default_output_file", alias = "outputFile")]
    pub output_file: String,
    #[serde(default)]
    pub encoding: EncodingChoice,
    #[serde(default)]
    pub axes: Vec<AxisConfig>,
}

fn default_data_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_file() -> String {
    "panels.html".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AxisConfig {
    #[serde(alias = "sourceFile")]
    pub source_file: Option<String>,
    #[serde(alias = "messageContentType")]
    pub message_content_type: Option<String>,
    #[serde(alias = "fieldPath")]
    pub field_path: Option<String>,
    pub datatype: Option<FieldKind>,
    #[serde(default, alias = "onChangeOnly")]
    pub on_change_only: bool,
    #[serde(alias = "datetimeFrom")]
    pub datetime_from: Option<String>,
    #[serde(alias = "datetimeTo")]
    pub datetime_to: Option<String>,
    pub ylabel: Option<String>,
    #[serde(default, alias = "plotType")]
    pub plot_type: PlotType,
    pub style: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "csvFileName")]
    pub csv_file_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotType {
    #[default]
    #[serde(alias = "plot")]
    Line,
    Step,
}

/// Configuration problems, all fatal and reported before any processing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("rows and columns fields are mandatory")]
    MissingGrid,

    #[error("axes count ({panels}) is > rows * columns ({capacity})")]
    TooManyPanels { panels: usize, capacity: usize },

    #[error("axes[{index}]: {field} must be present for each axis")]
    MissingPanelField { index: usize, field: &'static str },

    #[error("axes[{index}]: invalid time bound: {source}")]
    InvalidBound {
        index: usize,
        #[source]
        source: telemetry_decoder::DecoderError,
    },
}

/// One validated panel, ready to extract and render
#[derive(Debug, Clone)]
pub struct Panel {
    pub index: usize,
    pub source_file: PathBuf,
    pub extraction: FieldExtraction,
    pub datatype: Option<FieldKind>,
    pub ylabel: String,
    pub plot_type: PlotType,
    pub style: Option<String>,
    pub title: Option<String>,
    /// Base name (without extension) of the CSV export
    pub csv_name: Option<String>,
}

/// Validated grid
#[derive(Debug, Clone)]
pub struct PanelLayout {
    pub rows: usize,
    pub columns: usize,
    pub title: Option<String>,
    pub xlabel: String,
    pub data_path: PathBuf,
    pub output_file: PathBuf,
    pub encoding: EncodingChoice,
    pub panels: Vec<Panel>,
}

impl PanelsConfig {
    /// Check grid sizing and per-panel requirements
    pub fn validate(&self) -> std::result::Result<PanelLayout, ConfigError> {
        let (rows, columns) = match (self.rows, self.columns) {
            (Some(r), Some(c)) if r > 0 && c > 0 => (r, c),
            _ => return Err(ConfigError::MissingGrid),
        };

        let capacity = rows * columns;
        if self.axes.len() > capacity {
            return Err(ConfigError::TooManyPanels {
                panels: self.axes.len(),
                capacity,
            });
        }

        let panels = self
            .axes
            .iter()
            .enumerate()
            .map(|(index, axis)| axis.validate(index, &self.data_path))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(PanelLayout {
            rows,
            columns,
            title: self.title.clone(),
            xlabel: self.xlabel.clone().unwrap_or_else(|| "Timestamp".to_string()),
            data_path: self.data_path.clone(),
            output_file: self.data_path.join(&self.output_file),
            encoding: self.encoding,
            panels,
        })
    }
}

impl AxisConfig {
    fn validate(&self, index: usize, data_path: &Path) -> std::result::Result<Panel, ConfigError> {
        let missing = |field| ConfigError::MissingPanelField { index, field };

        let source_file = self.source_file.as_deref().ok_or_else(|| missing("sourceFile"))?;
        let message_type = self
            .message_content_type
            .as_deref()
            .ok_or_else(|| missing("messageContentType"))?;
        let field_path = self.field_path.as_deref().ok_or_else(|| missing("fieldPath"))?;

        let window = TimeWindow::parse(self.datetime_from.as_deref(), self.datetime_to.as_deref())
            .map_err(|source| ConfigError::InvalidBound { index, source })?;

        let path = FieldPath::parse(field_path);
        let ylabel = self.ylabel.clone().unwrap_or_else(|| path.leaf().to_string());

        let extraction = FieldExtraction::new(message_type, path)
            .with_label(format!("panel {}", index))
            .with_on_change_only(self.on_change_only)
            .with_window(window);

        Ok(Panel {
            index,
            source_file: data_path.join(source_file),
            extraction,
            datatype: self.datatype,
            ylabel,
            plot_type: self.plot_type,
            style: self.style.clone(),
            title: self.title.clone(),
            csv_name: self.csv_file_name.as_deref().map(strip_extension),
        })
    }
}

/// `"switch.csv"` → `"switch"`
fn strip_extension(name: &str) -> String {
    name.split('.').next().unwrap_or(name).to_string()
}

/// Load a panel configuration from a TOML or JSON file
pub fn load_config(path: &Path) -> Result<PanelsConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let config: PanelsConfig = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?
    } else {
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))?
    };

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_CONFIG: &str = r#"
        rows = 2
        columns = 1
        title = "Remote control"
        data_path = "data"

        [[axes]]
        source_file = "export.jsonl"
        message_content_type = "RemoteTrainControlTelegram"
        field_path = "message.MessagePayload.SystemControlOverrideSwitchActivated"
        datatype = "boolean"
        on_change_only = true
        csv_file_name = "override.csv"

        [[axes]]
        source_file = "export.jsonl"
        message_content_type = "Status"
        field_path = "message.Speed"
        plot_type = "step"
        datetime_from = "2026-01-26T10:00:00Z"
    "#;

    #[test]
    fn test_config_deserialization() {
        let config: PanelsConfig = toml::from_str(TOML_CONFIG).unwrap();
        assert_eq!(config.rows, Some(2));
        assert_eq!(config.axes.len(), 2);
        assert_eq!(config.axes[0].datatype, Some(FieldKind::Boolean));
        assert_eq!(config.axes[1].plot_type, PlotType::Step);
        assert_eq!(config.output_file, "panels.html");
    }

    #[test]
    fn test_validate_builds_panels() {
        let config: PanelsConfig = toml::from_str(TOML_CONFIG).unwrap();
        let layout = config.validate().unwrap();

        assert_eq!(layout.panels.len(), 2);
        assert_eq!(layout.xlabel, "Timestamp");
        assert_eq!(layout.output_file, PathBuf::from("data/panels.html"));

        let first = &layout.panels[0];
        assert_eq!(first.source_file, PathBuf::from("data/export.jsonl"));
        assert_eq!(first.ylabel, "SystemControlOverrideSwitchActivated");
        assert_eq!(first.csv_name.as_deref(), Some("override"));
        assert!(first.extraction.on_change_only);

        assert!(layout.panels[1].extraction.window.from.is_some());
    }

    #[test]
    fn test_camel_case_json() {
        let json = r#"{
            "rows": 1, "columns": 1,
            "axes": [{
                "sourceFile": "a.jsonl",
                "messageContentType": "T",
                "fieldPath": "message.X",
                "onChangeOnly": true,
                "plotType": "plot",
                "datatype": "string"
            }]
        }"#;
        let config: PanelsConfig = serde_json::from_str(json).unwrap();
        let layout = config.validate().unwrap();
        assert_eq!(layout.panels[0].plot_type, PlotType::Line);
        assert_eq!(layout.panels[0].datatype, Some(FieldKind::Categorical));
    }

    #[test]
    fn test_missing_grid() {
        let config: PanelsConfig = toml::from_str("rows = 1").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingGrid)));
    }

    #[test]
    fn test_too_many_panels() {
        let config: PanelsConfig = toml::from_str(
            r#"
            rows = 1
            columns = 1
            [[axes]]
            source_file = "a"
            message_content_type = "T"
            field_path = "x"
            [[axes]]
            source_file = "a"
            message_content_type = "T"
            field_path = "y"
        "#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManyPanels { panels: 2, capacity: 1 })
        ));
    }

    #[test]
    fn test_missing_panel_field() {
        let config: PanelsConfig = toml::from_str(
            r#"
            rows = 1
            columns = 2
            [[axes]]
            source_file = "a"
            field_path = "x"
        "#,
        )
        .unwrap();
        match config.validate() {
            Err(ConfigError::MissingPanelField { index, field }) => {
                assert_eq!(index, 0);
                assert_eq!(field, "messageContentType");
            }
            other => panic!("unexpected: {:?}", other.map(|l| l.panels.len())),
        }
    }

    #[test]
    fn test_invalid_bound() {
        let config: PanelsConfig = toml::from_str(
            r#"
            rows = 1
            columns = 1
            [[axes]]
            source_file = "a"
            message_content_type = "T"
            field_path = "x"
            datetime_to = "soon"
        "#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBound { index: 0, .. })
        ));
    }
}
