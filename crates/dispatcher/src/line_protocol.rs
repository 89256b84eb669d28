//! InfluxDB line protocol encoding
//!
//! `power_watts,host=<name> consumption_watts=<f>[,watts_today=<f>] <unix-nanos>`
//!
//! Line protocol has no representation for NaN or infinity; a point carrying
//! one is not encoded.

use std::fmt::{self, Write};

use contracts::MetricPoint;
use tracing::warn;

/// Encode one point as a single line (no trailing newline)
///
/// Returns `None` if a field is not a finite number.
pub fn encode_point(point: &MetricPoint) -> Option<String> {
    let fields = &point.fields;
    if !fields.consumption_watts.is_finite() || fields.watts_today.is_some_and(|v| !v.is_finite())
    {
        return None;
    }

    let mut line = String::with_capacity(64);
    write_point(&mut line, point).ok()?;
    Some(line)
}

fn write_point(line: &mut String, point: &MetricPoint) -> fmt::Result {
    line.push_str(&escape_measurement(&point.measurement));
    line.push_str(",host=");
    line.push_str(&escape_tag(&point.host));

    write!(line, " consumption_watts={}", point.fields.consumption_watts)?;
    if let Some(today) = point.fields.watts_today {
        write!(line, ",watts_today={today}")?;
    }

    let nanos = point
        .timestamp
        .timestamp_nanos_opt()
        .unwrap_or_else(|| point.timestamp.timestamp_micros().saturating_mul(1_000));
    write!(line, " {nanos}")
}

/// Encode a batch, one newline-terminated line per point
///
/// Points that cannot be encoded are skipped so the rest of the batch stays
/// writable.
pub fn encode_batch(points: &[MetricPoint]) -> String {
    points.iter().fold(String::new(), |mut body, point| {
        match encode_point(point) {
            Some(line) => {
                body.push_str(&line);
                body.push('\n');
            }
            None => warn!(host = %point.host, "skipping point with non-finite field"),
        }
        body
    })
}

/// Tag keys/values: escape comma, space and equals sign
fn escape_tag(value: &str) -> String {
    escape(value, &[',', ' ', '='])
}

/// Measurement names: escape comma and space
fn escape_measurement(value: &str) -> String {
    escape(value, &[',', ' '])
}

fn escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
