use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::{json, Value};

use crate::models::reading::Reading;
use crate::stats::{self, RollingPoint, CHART_TIME_FORMAT};

const LINE_COLOR: &str = "#4a90e2";
const FILL_COLOR: &str = "rgba(74, 144, 226, 0.1)";
const ROLLING_COLOR: &str = "#f39c12";
const GRID_COLOR: &str = "#eef2f7";

fn chart_time(ts: DateTime<Utc>, tz: Tz) -> String {
    stats::to_local(ts, tz).format(CHART_TIME_FORMAT).to_string()
}

/// Plotly figure (`{"data": [...], "layout": {...}}`) for the window, or
/// `None` when there is nothing to draw.
pub fn build_figure(
    readings: &[Reading],
    rolling: &[RollingPoint],
    peak: Option<&RollingPoint>,
    y_range: (i64, i64),
    window_minutes: i64,
    tz: Tz,
) -> Option<Value> {
    if readings.is_empty() {
        return None;
    }

    let x: Vec<String> = readings.iter().map(|r| chart_time(r.timestamp, tz)).collect();
    let y: Vec<f64> = readings.iter().map(|r| r.temp_f).collect();

    let mut data = vec![json!({
        "type": "scatter",
        "x": x,
        "y": y,
        "mode": "lines",
        "name": "Temperature (°F)",
        "line": { "color": LINE_COLOR, "width": 2.5 },
        "fill": "tozeroy",
        "fillcolor": FILL_COLOR,
    })];

    if !rolling.is_empty() {
        let rx: Vec<String> = rolling.iter().map(|p| chart_time(p.timestamp, tz)).collect();
        let ry: Vec<f64> = rolling.iter().map(|p| round2(p.value)).collect();
        data.push(json!({
            "type": "scatter",
            "x": rx,
            "y": ry,
            "mode": "lines",
            "name": format!("{}-min avg (°F)", window_minutes),
            "line": { "color": ROLLING_COLOR, "width": 1.5, "dash": "dot" },
        }));
    }

    let annotations: Vec<Value> = peak
        .map(|p| {
            json!({
                "x": chart_time(p.timestamp, tz),
                "y": round2(p.value),
                "text": format!("Peak {} °F", stats::format_temp(p.value)),
                "showarrow": true,
                "arrowhead": 2,
                "ax": 0,
                "ay": -30,
                "font": { "color": ROLLING_COLOR },
            })
        })
        .into_iter()
        .collect();

    Some(json!({
        "data": data,
        "layout": {
            "xaxis": { "title": null, "showgrid": false },
            "yaxis": {
                "title": { "text": "°F" },
                "range": [y_range.0, y_range.1],
                "gridcolor": GRID_COLOR,
            },
            "margin": { "l": 40, "r": 10, "t": 10, "b": 20 },
            "hovermode": "x unified",
            "template": "plotly_white",
            "paper_bgcolor": "rgba(0,0,0,0)",
            "plot_bgcolor": "rgba(0,0,0,0)",
            "showlegend": true,
            "legend": { "orientation": "h", "y": 1.08 },
            "annotations": annotations,
        },
    }))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
