//! Rounding and display helpers for KPI cards and exports.

use chrono::Duration;
use serde::Serializer;

/// Rounds to `places` decimal places, half away from zero.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Renders a duration as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Duration as fractional hours.
pub fn duration_hours(d: Duration) -> f64 {
    d.num_seconds() as f64 / 3600.0
}

/// Rounded value, or `N/A` when unknown.
pub fn format_optional(value: Option<f64>, places: u32) -> String {
    match value {
        Some(v) => format!("{:.*}", places as usize, round_to(v, places)),
        None => "N/A".to_string(),
    }
}

pub(crate) fn serialize_duration_secs<S: Serializer>(
    d: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(d.num_seconds())
}
