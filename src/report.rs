use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::chart;
use crate::config::DashboardConfig;
use crate::stats::{self, RollingSummary, WindowStats};
use crate::store::Store;

/// An alert shown above the dashboard. `kind` is a Bootstrap contextual
/// class: success, info, warning or danger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Notice {
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new("warning", message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new("danger", message)
    }

    /// Rocket flash kinds are "success", "warning" and "error".
    pub fn from_flash(kind: &str, message: &str) -> Self {
        let kind = match kind {
            "error" => "danger",
            "success" | "warning" | "info" | "danger" => kind,
            _ => "info",
        };
        Self::new(kind, message)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestView {
    pub temp_f: String,
    pub time_local: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub min_f: String,
    pub avg_f: String,
    pub max_f: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RollingView {
    pub window_minutes: i64,
    pub current_f: String,
    pub current_time: String,
    pub peak_f: String,
    pub peak_time: String,
}

/// Everything the dashboard shows for one window.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub hours: u32,
    pub latest: Option<LatestView>,
    pub stats: Option<StatsView>,
    pub rolling: Option<RollingView>,
    pub y_range: Option<(i64, i64)>,
    pub chart: Option<Value>,
    pub notices: Vec<Notice>,
}

impl Report {
    pub fn empty(hours: u32) -> Self {
        Report {
            hours,
            latest: None,
            stats: None,
            rolling: None,
            y_range: None,
            chart: None,
            notices: Vec::new(),
        }
    }
}

/// Resolve the `hours` query parameter. Anything outside the allowed list
/// falls back to the default with a warning.
pub fn resolve_hours(raw: Option<&str>, config: &DashboardConfig) -> (u32, Option<Notice>) {
    let default = config.default_hours;
    let raw = match raw {
        None => return (default, None),
        Some(r) => r.trim(),
    };
    match raw.parse::<i64>() {
        Ok(h) if config.is_allowed(h) => (h as u32, None),
        Ok(_) => (
            default,
            Some(Notice::warning(format!(
                "Invalid time range. Showing default {} hours.",
                default
            ))),
        ),
        Err(_) => (
            default,
            Some(Notice::warning(format!(
                "Invalid time range format. Showing default {} hours.",
                default
            ))),
        ),
    }
}

/// Query the store and compute the dashboard for the last `hours` hours.
/// Store failures become notices; whatever was fetched before the failure
/// is kept.
pub fn build(store: &dyn Store, config: &DashboardConfig, hours: u32, now: DateTime<Utc>) -> Report {
    let mut report = Report::empty(hours);

    if let Err(e) = store.ensure_connected() {
        log::error!("{}", e);
        report
            .notices
            .push(Notice::danger("Database connection failed. Please check server logs."));
        return report;
    }

    if let Err(e) = fill(&mut report, store, config, now) {
        log::error!("Error fetching or processing data: {}", e);
        report.chart = None;
        report
            .notices
            .push(Notice::warning(format!("Error fetching or processing data: {}", e)));
    }

    report
}

fn fill(
    report: &mut Report,
    store: &dyn Store,
    config: &DashboardConfig,
    now: DateTime<Utc>,
) -> Result<(), String> {
    let tz = config.tz();

    if let Some(latest) = store.latest_reading()? {
        report.latest = Some(LatestView {
            temp_f: latest
                .temp_f
                .map(stats::format_temp)
                .unwrap_or_else(|| "N/A".to_string()),
            time_local: latest
                .timestamp
                .map(|ts| stats::format_local(ts, tz))
                .unwrap_or_else(|| "N/A".to_string()),
        });
    }

    let start = now - Duration::hours(i64::from(report.hours));
    let readings = store.readings_since(start)?;

    let window = match WindowStats::compute(&readings) {
        Some(w) => w,
        None => {
            log::info!("No data found in the last {} hours.", report.hours);
            return Ok(());
        }
    };

    report.stats = Some(StatsView {
        min_f: stats::format_temp(window.min),
        avg_f: stats::format_temp(window.mean),
        max_f: stats::format_temp(window.max),
        count: window.count,
    });

    let width = config.rolling_window();
    let points = stats::rolling_average(&readings, width);
    let summary = RollingSummary::from_points(&points, width);
    if let Some(s) = &summary {
        report.rolling = Some(RollingView {
            window_minutes: s.window_minutes,
            current_f: stats::format_temp(s.current.value),
            current_time: stats::format_local(s.current.timestamp, tz),
            peak_f: stats::format_temp(s.peak.value),
            peak_time: stats::format_local(s.peak.timestamp, tz),
        });
    }

    let y_range = stats::y_axis_range(window.min, window.max, config.y_axis_padding);
    report.y_range = Some(y_range);
    report.chart = chart::build_figure(
        &readings,
        &points,
        summary.as_ref().map(|s| &s.peak),
        y_range,
        config.rolling_window_minutes,
        tz,
    );

    Ok(())
}
