use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::metrics::lpcd::{Population, lpcd};
use crate::metrics::pumping::{AggregatorOptions, daily_pumping};
use crate::metrics::types::DailyMetrics;
use crate::model::ReadingSeries;

/// Aggregates a series into per-day [`DailyMetrics`]: pumping duration, flow
/// total and LPCD for `population`.
pub fn daily_metrics(
    series: &ReadingSeries,
    population: Population,
    options: AggregatorOptions,
) -> BTreeMap<NaiveDate, DailyMetrics> {
    let daily: BTreeMap<NaiveDate, DailyMetrics> = daily_pumping(series, options)
        .into_iter()
        .map(|(date, totals)| {
            let metrics = DailyMetrics {
                date,
                pumping_duration: totals.pumping_duration,
                flow_total: totals.flow_total,
                lpcd: lpcd(totals.flow_total, population),
            };
            (date, metrics)
        })
        .collect();

    debug!(days = daily.len(), population = population.get(), "Daily metrics computed");
    daily
}
