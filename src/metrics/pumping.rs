//! Daily pumping-time and flow aggregation.
//!
//! A two-state machine (idle / pumping) folded over the sorted series. The
//! carried value holds the current day, the pump state and the per-day
//! accumulators. An interval never crosses midnight: a day change resets the
//! state before the new reading is considered.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::metrics::types::DailyPumping;
use crate::model::{Reading, ReadingSeries};

/// What to do with a pumping interval still open when its day's readings run
/// out (at a day change or at the end of the series).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrailingInterval {
    /// Contribute nothing. This undercounts pumping that is still running at
    /// the last reading of the day.
    #[default]
    Discard,
    /// Close the interval at the last reading seen on the same day.
    CloseAtLastReading,
}

/// How a strictly negative flow reading drives the state machine.
/// Negative flow is never added to the flow total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NegativeFlow {
    /// Behave like a zero reading: closes an open interval.
    #[default]
    TreatAsZero,
    /// Leave the state untouched.
    Ignore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorOptions {
    pub trailing: TrailingInterval,
    pub negative_flow: NegativeFlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpState {
    Idle,
    Pumping { start: NaiveDateTime },
}

#[derive(Debug)]
struct Fold {
    current_day: Option<NaiveDate>,
    last_seen: Option<NaiveDateTime>,
    state: PumpState,
    days: BTreeMap<NaiveDate, DailyPumping>,
}

impl Fold {
    fn new() -> Self {
        Self {
            current_day: None,
            last_seen: None,
            state: PumpState::Idle,
            days: BTreeMap::new(),
        }
    }

    fn step(self, reading: &Reading, options: AggregatorOptions) -> Self {
        let Some(ts) = reading.timestamp else {
            return self;
        };
        let day = ts.date();

        let mut next = if self.current_day == Some(day) {
            self
        } else {
            let mut rolled = self.close_day(options);
            rolled.current_day = Some(day);
            rolled.days.entry(day).or_default();
            rolled
        };
        next.last_seen = Some(ts);

        let flow = match reading.source_flow {
            None => return next,
            Some(f) if f < 0.0 => match options.negative_flow {
                NegativeFlow::TreatAsZero => 0.0,
                NegativeFlow::Ignore => return next,
            },
            Some(f) => f,
        };

        let totals = next.days.entry(day).or_default();
        next.state = match next.state {
            PumpState::Idle if flow > 0.0 => {
                totals.flow_total += flow;
                PumpState::Pumping { start: ts }
            }
            PumpState::Idle => PumpState::Idle,
            PumpState::Pumping { start } if flow > 0.0 => {
                totals.flow_total += flow;
                PumpState::Pumping { start }
            }
            PumpState::Pumping { start } => {
                totals.pumping_duration += ts - start;
                PumpState::Idle
            }
        };

        next
    }

    /// Settles an interval left open on the current day and returns to idle.
    fn close_day(mut self, options: AggregatorOptions) -> Self {
        if let (PumpState::Pumping { start }, Some(day), Some(last)) =
            (self.state, self.current_day, self.last_seen)
        {
            if options.trailing == TrailingInterval::CloseAtLastReading {
                self.days.entry(day).or_default().pumping_duration += last - start;
            }
        }
        self.state = PumpState::Idle;
        self
    }

    fn finish(self, options: AggregatorOptions) -> BTreeMap<NaiveDate, DailyPumping> {
        self.close_day(options).days
    }
}

/// Maps each calendar date in `series` to its pumping duration and flow
/// total.
///
/// Every date with at least one timed reading gets an entry, even when no
/// pumping happened. An empty series gives an empty map.
pub fn daily_pumping(
    series: &ReadingSeries,
    options: AggregatorOptions,
) -> BTreeMap<NaiveDate, DailyPumping> {
    series
        .timed()
        .fold(Fold::new(), |acc, reading| acc.step(reading, options))
        .finish(options)
}
