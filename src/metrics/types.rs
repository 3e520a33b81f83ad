//! Data types produced by the metrics pipeline.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::metrics::format::serialize_duration_secs;

/// Pumping time and delivered flow for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPumping {
    #[serde(serialize_with = "serialize_duration_secs", rename = "pumping_secs")]
    pub pumping_duration: Duration,
    /// Sum of positive flow readings, in kilolitres.
    pub flow_total: f64,
}

impl Default for DailyPumping {
    fn default() -> Self {
        Self {
            pumping_duration: Duration::zero(),
            flow_total: 0.0,
        }
    }
}

/// Per-day delivery figures handed to the dashboard and the daily CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_duration_secs", rename = "pumping_secs")]
    pub pumping_duration: Duration,
    pub flow_total: f64,
    pub lpcd: f64,
}

/// Window means for the quality parameters. `None` means no known value fell
/// inside the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowStats {
    pub mean_tds: Option<f64>,
    pub mean_ph: Option<f64>,
    pub mean_pressure: Option<f64>,
    pub samples: usize,
}
