//! Interactive HTML charts
//!
//! Charts are Plotly figure documents (`data` + `layout` JSON) embedded in a small HTML
//! page that loads plotly.js from its CDN.

use crate::config::{PanelLayout, PlotType};
use crate::panels::PanelResult;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use telemetry_decoder::{
    boolean_level, classify, format_timestamp, FieldKind, FieldValue, MessageTypeReport,
    TimeseriesPoint, Timestamp,
};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const COLORS: [&str; 20] = [
    "red", "blue", "green", "orange", "purple", "brown", "pink", "gray", "olive", "cyan",
    "magenta", "teal", "navy", "maroon", "lime", "indigo", "coral", "gold", "crimson",
    "darkgreen",
];

/// A Plotly figure
#[derive(Debug, Clone)]
pub struct Figure {
    traces: Vec<Value>,
    layout: Value,
    config: Value,
}

impl Figure {
    pub fn new(layout: Value) -> Self {
        Self {
            traces: Vec::new(),
            layout,
            config: json!({"displayModeBar": true, "displaylogo": false}),
        }
    }

    pub fn add_trace(&mut self, trace: Value) {
        self.traces.push(trace);
    }

    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    pub fn to_html(&self, title: &str) -> String {
        // Keep "</script>" inside JSON strings from closing the tag
        let data = Value::Array(self.traces.clone()).to_string().replace("</", "<\\/");
        let layout = self.layout.to_string().replace("</", "<\\/");
        let config = self.config.to_string();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}" charset="utf-8"></script>
</head>
<body>
<div id="chart" style="width:100%;"></div>
<script>
Plotly.newPlot("chart", {data}, {layout}, {config});
</script>
</body>
</html>
"#,
            title = escape_html(title),
            cdn = PLOTLY_CDN,
            data = data,
            layout = layout,
            config = config,
        )
    }

    pub fn write_html(&self, path: &Path, title: &str) -> Result<()> {
        fs::write(path, self.to_html(title))
            .with_context(|| format!("Failed to write chart: {:?}", path))?;
        log::info!("Chart saved as {:?}", path);
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn x_values<'a>(timestamps: impl Iterator<Item = &'a Timestamp>) -> Vec<Value> {
    timestamps.map(|t| json!(format_timestamp(t))).collect()
}

fn boolean_axis(title: &str) -> Value {
    json!({
        "title": {"text": title},
        "tickmode": "array",
        "tickvals": [0, 1],
        "ticktext": ["False", "True"],
    })
}

/// Plot coordinates for one column; categorical values also get hover labels
fn y_values<'a, I>(kind: FieldKind, values: I) -> (Vec<Value>, Option<Vec<String>>)
where
    I: Iterator<Item = Option<&'a FieldValue>>,
{
    match kind {
        FieldKind::Boolean => (
            values.map(|v| v.map_or(Value::Null, |v| json!(boolean_level(v)))).collect(),
            None,
        ),
        FieldKind::Numeric | FieldKind::Unknown => (
            values
                .map(|v| v.and_then(FieldValue::as_f64).map_or(Value::Null, |f| json!(f)))
                .collect(),
            None,
        ),
        FieldKind::Categorical => {
            let mut codes: HashMap<String, usize> = HashMap::new();
            let mut ys = Vec::new();
            let mut labels = Vec::new();
            for value in values {
                match value {
                    Some(v) => {
                        let label = v.to_string();
                        let next = codes.len();
                        let code = *codes.entry(label.clone()).or_insert(next);
                        ys.push(json!(code));
                        labels.push(label);
                    }
                    None => {
                        ys.push(Value::Null);
                        labels.push(String::new());
                    }
                }
            }
            (ys, Some(labels))
        }
    }
}

/// Matplotlib-like format string (`"-b"`, `"--r"`, `"o:g"`) → Plotly line settings
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: Option<&'static str>,
    pub dash: &'static str,
    pub markers: bool,
}

impl LineStyle {
    pub fn parse(style: &str) -> Self {
        let color = style.chars().find_map(|c| match c {
            'b' => Some("blue"),
            'g' => Some("green"),
            'r' => Some("red"),
            'c' => Some("cyan"),
            'm' => Some("magenta"),
            'y' => Some("gold"),
            'k' => Some("black"),
            'w' => Some("white"),
            _ => None,
        });

        let dash = if style.contains("-.") {
            "dashdot"
        } else if style.contains("--") {
            "dash"
        } else if style.contains(':') {
            "dot"
        } else {
            "solid"
        };

        let markers = style.chars().any(|c| matches!(c, 'o' | '.' | 'x' | '+' | '*' | 's' | '^'))
            && !style.contains("-.");

        Self { color, dash, markers }
    }
}

/// Table of per-type statistics
pub fn message_type_table(report: &MessageTypeReport, base: &str) -> Figure {
    let column = |f: &dyn Fn(&telemetry_decoder::MessageTypeStats) -> Value| -> Vec<Value> {
        report.stats.iter().map(f).collect()
    };

    let mut figure = Figure::new(json!({
        "title": {"text": format!("Message Type Distribution - {}", base)},
        "height": (report.stats.len() * 30 + 100).max(400),
    }));

    figure.add_trace(json!({
        "type": "table",
        "header": {
            "values": ["Message Type", "Count", "Percentage (%)", "Avg Interval"],
            "fill": {"color": "paleturquoise"},
            "align": "left",
            "font": {"size": 12, "color": "black"},
        },
        "cells": {
            "values": [
                column(&|s| json!(s.message_type)),
                column(&|s| json!(s.count)),
                column(&|s| json!((s.percentage * 100.0).round() / 100.0)),
                column(&|s| json!(s.formatted_interval())),
            ],
            "fill": {"color": "lavender"},
            "align": "left",
            "font": {"size": 11},
        },
    }));

    figure
}

/// Bar chart of record counts per type
pub fn message_type_bar(report: &MessageTypeReport, base: &str) -> Figure {
    let names: Vec<&str> = report.stats.iter().map(|s| s.message_type.as_str()).collect();
    let counts: Vec<usize> = report.stats.iter().map(|s| s.count).collect();

    let mut figure = Figure::new(json!({
        "title": {"text": format!("Message Type Count Distribution - {}", base)},
        "xaxis": {"title": {"text": "Message Type"}, "tickangle": -45},
        "yaxis": {"title": {"text": "Count"}},
        "height": 600,
    }));

    figure.add_trace(json!({
        "type": "bar",
        "x": names,
        "y": counts,
        "text": counts,
        "textposition": "auto",
        "marker": {"color": "indianred"},
    }));

    figure
}

/// Scatter of inter-arrival intervals, one trace per type
pub fn message_type_scatter(report: &MessageTypeReport, base: &str) -> Figure {
    let mut figure = Figure::new(json!({
        "title": {"text": format!("Message Type Intervals - {}", base)},
        "xaxis": {"title": {"text": "Timestamp"}, "type": "date"},
        "yaxis": {"title": {"text": "Interval (seconds)"}},
    }));

    for stats in &report.stats {
        let (xs, ys): (Vec<String>, Vec<f64>) = stats
            .interval_points()
            .map(|(t, seconds)| (format_timestamp(&t), seconds))
            .unzip();

        figure.add_trace(json!({
            "type": "scatter",
            "mode": "markers",
            "name": stats.message_type,
            "x": xs,
            "y": ys,
        }));
    }

    figure
}

/// Multi-field timeseries chart
///
/// Boolean fields go on the left axis; numeric and categorical fields move to a
/// right-hand axis when booleans are also present.
pub fn timeseries_chart(
    points: &[TimeseriesPoint],
    kinds: &[(String, FieldKind)],
    base: &str,
    lightweight: bool,
) -> Figure {
    let fields_of = |wanted: FieldKind| -> Vec<&str> {
        let mut names: Vec<&str> = kinds
            .iter()
            .filter(|(_, k)| *k == wanted)
            .map(|(n, _)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    };

    let boolean_fields = fields_of(FieldKind::Boolean);
    let numeric_fields = fields_of(FieldKind::Numeric);
    let string_fields = fields_of(FieldKind::Categorical);
    let dual_axis = !boolean_fields.is_empty() && !numeric_fields.is_empty();
    let secondary = if dual_axis { "y2" } else { "y" };

    let xs = x_values(points.iter().map(|p| &p.timestamp));
    let mut figure = Figure::new(Value::Null);
    let mut color_index = 0;
    let mut next_color = || {
        let color = COLORS[color_index % COLORS.len()];
        color_index += 1;
        color
    };

    for name in &boolean_fields {
        let color = next_color();
        let (ys, _) = y_values(FieldKind::Boolean, points.iter().map(|p| p.get(name)));
        figure.add_trace(json!({
            "type": "scatter",
            "mode": "lines",
            "name": format!("{} (bool)", name),
            "x": xs,
            "y": ys,
            "yaxis": "y",
            "line": {"color": color, "width": 4},
            "connectgaps": false,
            "hovertemplate": format!("%{{x}}<br>{}: %{{y}}<extra></extra>", name),
        }));
    }

    for name in &numeric_fields {
        let color = next_color();
        let (ys, _) = y_values(FieldKind::Numeric, points.iter().map(|p| p.get(name)));
        let mut trace = json!({
            "type": "scatter",
            "mode": if lightweight { "lines" } else { "lines+markers" },
            "name": format!("{} (num)", name),
            "x": xs,
            "y": ys,
            "yaxis": secondary,
            "line": {"color": color, "width": 2},
            "hovertemplate": format!("%{{x}}<br>{}: %{{y}}<extra></extra>", name),
        });
        if !lightweight {
            trace["marker"] = json!({"size": 4, "color": color});
        }
        figure.add_trace(trace);
    }

    for name in &string_fields {
        let color = next_color();
        let (ys, labels) = y_values(FieldKind::Categorical, points.iter().map(|p| p.get(name)));
        figure.add_trace(json!({
            "type": "scatter",
            "mode": "lines+markers",
            "name": format!("{} (str)", name),
            "x": xs,
            "y": ys,
            "yaxis": secondary,
            "line": {"color": color, "width": 2},
            "marker": {"size": 6, "color": color},
            "text": labels.unwrap_or_default(),
            "hovertemplate": format!("%{{x}}<br>{}: %{{text}}<extra></extra>", name),
        }));
    }

    let mut xaxis = json!({"title": {"text": "Time (UTC)"}, "type": "date"});
    if !lightweight {
        xaxis["rangeslider"] = json!({"visible": true});
        xaxis["rangeselector"] = json!({
            "buttons": [
                {"count": 1, "label": "1m", "step": "minute", "stepmode": "backward"},
                {"count": 5, "label": "5m", "step": "minute", "stepmode": "backward"},
                {"count": 15, "label": "15m", "step": "minute", "stepmode": "backward"},
                {"count": 1, "label": "1h", "step": "hour", "stepmode": "backward"},
                {"step": "all", "label": "All"},
            ]
        });
    }

    let mut layout = json!({
        "title": {"text": format!("Telemetry Data: {}", base)},
        "xaxis": xaxis,
        "hovermode": "x unified",
        "showlegend": true,
        "height": 700,
    });

    if dual_axis {
        layout["yaxis"] = boolean_axis("Boolean");
        layout["yaxis2"] = json!({
            "title": {"text": "Numeric Values"},
            "overlaying": "y",
            "side": "right",
        });
    } else if !boolean_fields.is_empty() {
        layout["yaxis"] = boolean_axis("Boolean");
    } else if !numeric_fields.is_empty() {
        layout["yaxis"] = json!({"title": {"text": "Numeric Values"}});
    } else {
        layout["yaxis"] = json!({"title": {"text": "Values"}});
    }

    figure.layout = layout;
    figure
}

/// One trace for one extracted series, drawn on the given axes
fn series_trace(
    points: &[telemetry_decoder::TimestampedValue],
    kind: FieldKind,
    name: &str,
    plot_type: PlotType,
    style: Option<&str>,
    axes: (&str, &str),
) -> Value {
    let xs = x_values(points.iter().map(|p| &p.timestamp));
    let (ys, labels) = y_values(kind, points.iter().map(|p| Some(&p.value)));
    let style = LineStyle::parse(style.unwrap_or("-b"));

    let step = kind == FieldKind::Boolean || plot_type == PlotType::Step;
    let mut line = json!({"dash": style.dash, "shape": if step { "hv" } else { "linear" }});
    if let Some(color) = style.color {
        line["color"] = json!(color);
    }

    let mut trace = json!({
        "type": "scatter",
        "mode": if style.markers { "lines+markers" } else { "lines" },
        "name": name,
        "x": xs,
        "y": ys,
        "xaxis": axes.0,
        "yaxis": axes.1,
        "line": line,
    });
    if let Some(labels) = labels {
        trace["text"] = json!(labels);
        trace["hovertemplate"] = json!(format!("%{{x}}<br>{}: %{{text}}<extra></extra>", name));
    }
    trace
}

/// Step/line chart of a single extracted field
pub fn series_chart(
    points: &[telemetry_decoder::TimestampedValue],
    kind: FieldKind,
    name: &str,
    title: &str,
) -> Figure {
    let yaxis = if kind == FieldKind::Boolean {
        boolean_axis(name)
    } else {
        json!({"title": {"text": name}})
    };

    let mut figure = Figure::new(json!({
        "title": {"text": title},
        "xaxis": {"title": {"text": "timestamp"}, "type": "date"},
        "yaxis": yaxis,
    }));
    figure.add_trace(series_trace(points, kind, name, PlotType::Step, None, ("x", "y")));
    figure
}

/// Grid of panels, filled row by row
pub fn panel_grid(layout: &PanelLayout, results: &[PanelResult]) -> Figure {
    const GAP: f64 = 0.04;

    let mut figure = Figure::new(Value::Null);
    let mut plotly_layout = json!({
        "showlegend": false,
        "height": 350 * layout.rows,
        "annotations": [],
    });
    if let Some(title) = &layout.title {
        plotly_layout["title"] = json!({"text": title});
    }

    for (slot, result) in results.iter().enumerate() {
        let panel = &result.panel;
        let row = slot / layout.columns;
        let column = slot % layout.columns;
        let axis_number = slot + 1;
        let suffix = if axis_number == 1 { String::new() } else { axis_number.to_string() };

        let kind = panel
            .datatype
            .unwrap_or_else(|| classify(result.series.values()));

        let x_domain = [
            column as f64 / layout.columns as f64 + GAP,
            (column + 1) as f64 / layout.columns as f64 - GAP,
        ];
        let y_domain = [
            1.0 - (row + 1) as f64 / layout.rows as f64 + GAP,
            1.0 - row as f64 / layout.rows as f64 - GAP,
        ];

        let mut yaxis = if kind == FieldKind::Boolean {
            boolean_axis(&panel.ylabel)
        } else {
            json!({"title": {"text": panel.ylabel}})
        };
        yaxis["domain"] = json!(y_domain);
        let x_anchor = format!("x{}", suffix);
        let y_anchor = format!("y{}", suffix);
        yaxis["anchor"] = json!(x_anchor);

        let mut xaxis = json!({"type": "date", "domain": x_domain, "anchor": y_anchor});
        if row + 1 == layout.rows || slot + layout.columns >= results.len() {
            xaxis["title"] = json!({"text": layout.xlabel});
        }

        plotly_layout[format!("xaxis{}", suffix)] = xaxis;
        plotly_layout[format!("yaxis{}", suffix)] = yaxis;

        if let Some(title) = &panel.title {
            if let Some(annotations) = plotly_layout["annotations"].as_array_mut() {
                annotations.push(json!({
                    "text": title,
                    "showarrow": false,
                    "xref": "paper",
                    "yref": "paper",
                    "x": (x_domain[0] + x_domain[1]) / 2.0,
                    "y": y_domain[1],
                    "xanchor": "center",
                    "yanchor": "bottom",
                }));
            }
        }

        figure.add_trace(series_trace(
            &result.series.points,
            kind,
            &panel.ylabel,
            panel.plot_type,
            panel.style.as_deref(),
            (x_anchor.as_str(), y_anchor.as_str()),
        ));
    }

    figure.layout = plotly_layout;
    figure
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_decoder::parse_timestamp;

    fn point(ts: &str, values: &[(&str, FieldValue)]) -> TimeseriesPoint {
        let mut p = TimeseriesPoint::new(parse_timestamp(ts).unwrap(), "T");
        for (name, value) in values {
            p.values.insert(name.to_string(), value.clone());
        }
        p
    }

    #[test]
    fn test_line_style_parse() {
        assert_eq!(
            LineStyle::parse("-b"),
            LineStyle { color: Some("blue"), dash: "solid", markers: false }
        );
        assert_eq!(LineStyle::parse("--r").dash, "dash");
        assert!(LineStyle::parse("o:g").markers);
        assert_eq!(LineStyle::parse("-.k").dash, "dashdot");
    }

    #[test]
    fn test_categorical_codes_follow_first_appearance() {
        let values = [
            FieldValue::Text("Off".into()),
            FieldValue::Text("On".into()),
            FieldValue::Text("Off".into()),
        ];
        let (ys, labels) = y_values(
            FieldKind::Categorical,
            values.iter().map(Some).chain(std::iter::once(None)),
        );
        assert_eq!(ys, vec![json!(0), json!(1), json!(0), Value::Null]);
        assert_eq!(labels.unwrap()[1], "On");
    }

    #[test]
    fn test_timeseries_chart_dual_axis() {
        let points = vec![
            point(
                "2026-01-26T10:00:00Z",
                &[("Horn", FieldValue::Boolean(true)), ("Speed", FieldValue::Integer(3))],
            ),
            point("2026-01-26T10:00:01Z", &[("Horn", FieldValue::Boolean(false))]),
        ];
        let kinds = vec![
            ("Horn".to_string(), FieldKind::Boolean),
            ("Speed".to_string(), FieldKind::Numeric),
        ];

        let figure = timeseries_chart(&points, &kinds, "export", true);
        assert_eq!(figure.trace_count(), 2);
        assert_eq!(figure.traces[0]["y"], json!([1, 0]));
        assert_eq!(figure.traces[1]["yaxis"], "y2");
        assert_eq!(figure.traces[1]["y"], json!([3.0, null]));
        assert_eq!(figure.layout["yaxis"]["ticktext"], json!(["False", "True"]));
        assert!(figure.layout["xaxis"].get("rangeslider").is_none());
    }

    #[test]
    fn test_html_escapes_script_end() {
        let mut figure = Figure::new(json!({"title": {"text": "</script>"}}));
        figure.add_trace(json!({"type": "bar", "x": ["a"], "y": [1]}));
        let html = figure.to_html("a < b");
        assert!(html.contains("<title>a &lt; b</title>"));
        assert!(!html.contains("\"</script>\""));
        assert!(html.contains(PLOTLY_CDN));
    }
}
