use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use mongodb::bson::{Bson, Document};
use serde::Serialize;

/// Document field holding the sample time.
pub const TIMESTAMP_FIELD: &str = "timestamp";
/// Document field holding the averaged temperature in °F.
pub const TEMP_FIELD: &str = "average_temp_f";

/// A fully usable sample: both fields present and coercible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub temp_f: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, temp_f: f64) -> Self {
        Reading { timestamp, temp_f }
    }

    /// Coerce a raw document. Returns `None` if either field is unusable.
    pub fn from_document(doc: &Document) -> Option<Self> {
        PartialReading::from_document(doc).complete()
    }
}

/// The newest document as stored, with each field coerced independently so
/// the latest-reading panel can show what it has.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PartialReading {
    pub timestamp: Option<DateTime<Utc>>,
    pub temp_f: Option<f64>,
}

impl PartialReading {
    pub fn from_document(doc: &Document) -> Self {
        PartialReading {
            timestamp: coerce_timestamp(doc.get(TIMESTAMP_FIELD)),
            temp_f: coerce_temp(doc.get(TEMP_FIELD)),
        }
    }

    pub fn complete(&self) -> Option<Reading> {
        Some(Reading::new(self.timestamp?, self.temp_f?))
    }
}

impl From<Reading> for PartialReading {
    fn from(r: Reading) -> Self {
        PartialReading {
            timestamp: Some(r.timestamp),
            temp_f: Some(r.temp_f),
        }
    }
}

/// BSON datetimes are taken as-is. Strings are parsed as RFC 3339, or as a
/// naive `YYYY-MM-DD HH:MM:SS` which is assumed to be UTC.
///
/// Only the latest-reading lookup sees string timestamps. MongoDB range
/// filters compare against BSON dates, so string rows never fall inside a
/// window and never reach the stats, chart or delete.
pub fn coerce_timestamp(value: Option<&Bson>) -> Option<DateTime<Utc>> {
    match value? {
        Bson::DateTime(dt) => Utc.timestamp_millis_opt(dt.timestamp_millis()).single(),
        Bson::String(s) => parse_timestamp(s),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Numbers of any BSON width, or numeric strings. NaN and infinities are
/// treated as missing.
pub fn coerce_temp(value: Option<&Bson>) -> Option<f64> {
    let v = match value? {
        Bson::Double(d) => *d,
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}
