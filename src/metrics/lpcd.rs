//! Litres per capita per day.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;
use crate::metrics::types::DailyMetrics;
use crate::metrics::utility::mean;

/// Population served when none is configured.
pub const DEFAULT_POPULATION: u32 = 10_000;

/// Trailing window for the weekly average, reference day included.
pub const WEEK_DAYS: u64 = 7;

/// Number of people served by the scheme. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Population(u32);

impl Population {
    pub fn new(count: i64) -> Result<Self, MetricsError> {
        match u32::try_from(count) {
            Ok(n) if n > 0 => Ok(Self(n)),
            _ => Err(MetricsError::InvalidPopulation(count)),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Population {
    fn default() -> Self {
        Self(DEFAULT_POPULATION)
    }
}

impl TryFrom<i64> for Population {
    type Error = MetricsError;

    fn try_from(count: i64) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<Population> for u32 {
    fn from(p: Population) -> Self {
        p.0
    }
}

/// Converts a day's flow total (kilolitres) into litres per person.
pub fn lpcd(flow_total_kl: f64, population: Population) -> f64 {
    flow_total_kl * 1000.0 / population.get() as f64
}

/// Mean LPCD over the seven days ending at `reference`.
///
/// Only days present in `daily` count towards the mean; a missing day is not
/// a zero day. Returns `None` when no day in the window has data.
pub fn weekly_lpcd(daily: &BTreeMap<NaiveDate, DailyMetrics>, reference: NaiveDate) -> Option<f64> {
    let start = reference
        .checked_sub_days(Days::new(WEEK_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);

    let values: Vec<f64> = daily.range(start..=reference).map(|(_, m)| m.lpcd).collect();
    mean(&values)
}
