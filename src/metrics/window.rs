//! Half-open time windows and the quality means computed over them.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::MetricsError;
use crate::metrics::types::WindowStats;
use crate::metrics::utility::mean;
use crate::model::{Parameter, ReadingSeries};

/// `[start, end)`. `start == end` is a valid, empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Window {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, MetricsError> {
        if start > end {
            return Err(MetricsError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// Means of TDS, pH and pressure over the readings inside `window`.
pub fn window_stats(series: &ReadingSeries, window: &Window) -> WindowStats {
    let inside = series.within(window);

    let mean_of = |param: Parameter| {
        let values: Vec<f64> = inside.readings().iter().filter_map(|r| r.value(param)).collect();
        mean(&values)
    };

    WindowStats {
        mean_tds: mean_of(Parameter::Tds),
        mean_ph: mean_of(Parameter::Ph),
        mean_pressure: mean_of(Parameter::Pressure),
        samples: inside.len(),
    }
}
