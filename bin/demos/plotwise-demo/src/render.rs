// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use indexmap::IndexMap;
use plotwise::{ChartKind, ChartRenderer, ChartSpec, Column, ColumnKind, EncodingRole};
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart '{title}' references missing columns: {}", .columns.join(", "))]
    MissingColumns { title: String, columns: Vec<String> },
    #[error("Chart '{title}' has no {role:?} column bound")]
    Unbound { title: String, role: EncodingRole },
    #[error("Column '{column}' must be numeric for {kind}")]
    NotNumeric { column: String, kind: ChartKind },
    #[error("Failed to write chart page: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode figure: {0}")]
    Json(#[from] serde_json::Error),
}

/// Builds Plotly figure JSON (`{"data": [...], "layout": {...}}`).
#[derive(Debug, Clone, Default)]
pub struct PlotlyRenderer;

impl ChartRenderer for PlotlyRenderer {
    type Figure = Value;
    type Error = RenderError;

    fn render(&self, spec: &ChartSpec) -> Result<Value, RenderError> {
        let missing = spec.missing_columns();
        if !missing.is_empty() {
            return Err(RenderError::MissingColumns {
                title: spec.title.clone(),
                columns: missing.into_iter().map(str::to_string).collect(),
            });
        }
        let (traces, layout) = match spec.kind {
            ChartKind::Pie | ChartKind::Donut => {
                let mut trace = json!({
                    "type": "pie",
                    "labels": cells(spec, EncodingRole::Category)?,
                    "values": numbers(spec, EncodingRole::Value)?,
                });
                if let Some(hole) = spec.options.hole {
                    trace["hole"] = json!(hole);
                }
                (vec![trace], json!({}))
            }
            ChartKind::Bar | ChartKind::Column => {
                let category = bound(spec, EncodingRole::Category)?;
                let value = bound(spec, EncodingRole::Value)?;
                let trace = json!({
                    "type": "bar",
                    "x": cells(spec, EncodingRole::Category)?,
                    "y": numbers(spec, EncodingRole::Value)?,
                });
                (vec![trace], axes(category, value))
            }
            ChartKind::HorizontalBar => {
                let category = bound(spec, EncodingRole::Category)?;
                let value = bound(spec, EncodingRole::Value)?;
                let trace = json!({
                    "type": "bar",
                    "orientation": "h",
                    "x": numbers(spec, EncodingRole::Value)?,
                    "y": cells(spec, EncodingRole::Category)?,
                });
                (vec![trace], axes(value, category))
            }
            ChartKind::Scatter | ChartKind::Bubble => {
                let x = bound(spec, EncodingRole::X)?;
                let y = bound(spec, EncodingRole::Y)?;
                (point_traces(spec)?, axes(x, y))
            }
            ChartKind::Histogram => {
                let x = bound(spec, EncodingRole::X)?;
                let mut trace = json!({
                    "type": "histogram",
                    "x": numbers(spec, EncodingRole::X)?,
                });
                if let Some(bins) = spec.options.bins {
                    trace["nbinsx"] = json!(bins);
                }
                (vec![trace], axes(x, "count"))
            }
            ChartKind::RadialBar => {
                let trace = json!({
                    "type": "barpolar",
                    "r": numbers(spec, EncodingRole::Value)?,
                    "theta": cells(spec, EncodingRole::Category)?,
                });
                (vec![trace], json!({}))
            }
        };
        let mut layout = layout;
        layout["title"] = json!({ "text": spec.title });
        Ok(json!({ "data": traces, "layout": layout }))
    }
}

fn axes(x: &str, y: &str) -> Value {
    json!({
        "xaxis": { "title": { "text": x } },
        "yaxis": { "title": { "text": y } },
    })
}

fn bound(spec: &ChartSpec, role: EncodingRole) -> Result<&str, RenderError> {
    spec.column_for(role).ok_or_else(|| RenderError::Unbound {
        title: spec.title.clone(),
        role,
    })
}

fn column<'a>(spec: &'a ChartSpec, role: EncodingRole) -> Result<&'a Column, RenderError> {
    let name = bound(spec, role)?;
    spec.data
        .column(name)
        .ok_or_else(|| RenderError::MissingColumns {
            title: spec.title.clone(),
            columns: vec![name.to_string()],
        })
}

/// Display values of a bound column; missing cells become `null`.
fn cells(spec: &ChartSpec, role: EncodingRole) -> Result<Vec<Value>, RenderError> {
    let column = column(spec, role)?;
    Ok((0..column.len())
        .map(|row| match column.kind() {
            ColumnKind::Number => column.number_at(row).map_or(Value::Null, |v| json!(v)),
            _ => column.display_at(row).map_or(Value::Null, Value::String),
        })
        .collect())
}

fn numbers(spec: &ChartSpec, role: EncodingRole) -> Result<Vec<Value>, RenderError> {
    let column = column(spec, role)?;
    if column.kind() != ColumnKind::Number {
        return Err(RenderError::NotNumeric {
            column: column.name().to_string(),
            kind: spec.kind,
        });
    }
    cells(spec, role)
}

/// One trace per colour group, in first-appearance order.
fn point_traces(spec: &ChartSpec) -> Result<Vec<Value>, RenderError> {
    let xs = numbers(spec, EncodingRole::X)?;
    let ys = numbers(spec, EncodingRole::Y)?;
    let sizes = match spec.kind {
        ChartKind::Bubble => Some(numbers(spec, EncodingRole::Size)?),
        _ => None,
    };
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    match spec.column_for(EncodingRole::Color) {
        Some(_) => {
            for (row, key) in cells(spec, EncodingRole::Color)?.into_iter().enumerate() {
                let key = match key {
                    Value::String(s) => s,
                    Value::Null => "(missing)".to_string(),
                    other => other.to_string(),
                };
                groups.entry(key).or_default().push(row);
            }
        }
        None => {
            groups.insert(String::new(), (0..xs.len()).collect());
        }
    }
    let sizeref = sizes.as_ref().map(|sizes| {
        let max = sizes.iter().filter_map(Value::as_f64).fold(0.0_f64, f64::max);
        let size_max = spec.options.size_max.unwrap_or(20.0);
        if max > 0.0 {
            2.0 * max / (size_max * size_max)
        } else {
            1.0
        }
    });

    let traces = groups
        .into_iter()
        .map(|(name, rows)| {
            let pick = |values: &[Value]| -> Vec<Value> {
                rows.iter().map(|&r| values[r].clone()).collect()
            };
            let mode = if spec.options.point_labels {
                "markers+text"
            } else {
                "markers"
            };
            let mut trace = json!({
                "type": "scatter",
                "mode": mode,
                "x": pick(xs.as_slice()),
                "y": pick(ys.as_slice()),
            });
            if !name.is_empty() {
                trace["name"] = json!(name);
            }
            if let (Some(sizes), Some(sizeref)) = (&sizes, sizeref) {
                trace["marker"] = json!({
                    "size": pick(sizes.as_slice()),
                    "sizemode": "area",
                    "sizeref": sizeref,
                });
            }
            if spec.options.point_labels {
                let labels: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
                trace["text"] = json!(labels);
                trace["textposition"] = json!("top center");
            }
            trace
        })
        .collect();
    Ok(traces)
}

/// Standalone HTML page drawing `figure` with Plotly.
pub fn figure_html(figure: &Value, title: &str) -> Result<String, RenderError> {
    let figure = script_safe(&serde_json::to_string(figure)?);
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:90vh;"></div>
<script>
const figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
        title = escape(title),
    ))
}

/// JSON text with `<`, `>` and `&` as unicode escapes, so cell values
/// cannot close the surrounding `<script>` element.
fn script_safe(json: &str) -> String {
    json.replace('&', "\\u0026")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders `spec` into a kept temporary HTML file and returns its path.
pub fn write_chart_html(
    renderer: &PlotlyRenderer,
    spec: &ChartSpec,
) -> Result<PathBuf, RenderError> {
    let figure = renderer.render(spec)?;
    let html = figure_html(&figure, &spec.title)?;
    let mut file = tempfile::Builder::new()
        .prefix("plotwise-")
        .suffix(".html")
        .tempfile()?;
    file.write_all(html.as_bytes())?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}

pub fn open_in_browser(path: &std::path::Path) -> std::io::Result<()> {
    let url = format!("file://{}", path.display());
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    command.arg(url).spawn().map(|_| ())
}
