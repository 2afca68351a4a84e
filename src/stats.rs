use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::reading::Reading;

/// Display format for local timestamps, e.g. `2024-03-10 01:59:00 AM`.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";

/// Format Plotly parses as a wall-clock date without shifting it.
pub const CHART_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Timezone ────────────────────────────────────────────

pub fn to_local(ts: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    ts.with_timezone(&tz)
}

pub fn format_local(ts: DateTime<Utc>, tz: Tz) -> String {
    to_local(ts, tz).format(LOCAL_TIME_FORMAT).to_string()
}

pub fn format_temp(value: f64) -> String {
    format!("{:.2}", value)
}

// ── Window statistics ───────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

impl WindowStats {
    /// Min, max and arithmetic mean over the readings. `None` when empty.
    pub fn compute(readings: &[Reading]) -> Option<Self> {
        if readings.is_empty() {
            return None;
        }
        let (min, max, sum) = readings.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, sum), r| (lo.min(r.temp_f), hi.max(r.temp_f), sum + r.temp_f),
        );
        Some(WindowStats {
            min,
            max,
            mean: sum / readings.len() as f64,
            count: readings.len(),
        })
    }
}

// ── Rolling average ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Trailing time-window mean. The value at reading `i` averages every reading
/// whose timestamp lies in `(t_i - width, t_i]`, never looking ahead of `i`.
///
/// Readings that share a timestamp all get the same value. Each window is
/// summed afresh so equal windows give bit-equal averages.
///
/// Readings must already be sorted by timestamp ascending.
pub fn rolling_average(readings: &[Reading], width: Duration) -> Vec<RollingPoint> {
    let mut points = Vec::with_capacity(readings.len());
    let mut start = 0usize;
    let mut i = 0usize;

    while i < readings.len() {
        // Readings sharing a timestamp form one group with one value.
        let t = readings[i].timestamp;
        let mut end = i + 1;
        while end < readings.len() && readings[end].timestamp == t {
            end += 1;
        }

        let floor = t - width;
        while start < i && readings[start].timestamp <= floor {
            start += 1;
        }

        let window = &readings[start..end];
        let value = window.iter().map(|r| r.temp_f).sum::<f64>() / window.len() as f64;
        points.extend(readings[i..end].iter().map(|r| RollingPoint {
            timestamp: r.timestamp,
            value,
        }));
        i = end;
    }

    points
}

/// Highest rolling value. Ties keep the earliest point.
pub fn peak(points: &[RollingPoint]) -> Option<RollingPoint> {
    points.iter().copied().fold(None, |best, p| match best {
        Some(b) if b.value >= p.value => Some(b),
        _ => Some(p),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingSummary {
    pub window_minutes: i64,
    pub current: RollingPoint,
    pub peak: RollingPoint,
}

impl RollingSummary {
    pub fn from_points(points: &[RollingPoint], width: Duration) -> Option<Self> {
        Some(RollingSummary {
            window_minutes: width.num_minutes(),
            current: *points.last()?,
            peak: peak(points)?,
        })
    }
}

// ── Y-axis range ────────────────────────────────────────

/// Integer chart bounds around `[min, max]` with `padding` degrees on each
/// side. A flat series gets at least one degree either way, and a range
/// that collapses after padding is widened to one degree.
pub fn y_axis_range(min: f64, max: f64, padding: f64) -> (i64, i64) {
    #[allow(clippy::float_cmp)]
    let pad = if min == max { padding.max(1.0) } else { padding };

    let mut lo = (min - pad).floor();
    let mut hi = (max + pad).ceil();

    if lo >= hi {
        lo = if hi > 0.0 { (hi - 1.0).floor() } else { -1.0 };
        hi = if lo < 100.0 { (lo + 1.0).ceil() } else { lo + 1.0 };
    }

    (lo as i64, hi as i64)
}
