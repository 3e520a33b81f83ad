//! Sensor readings and the time-ordered series the aggregator consumes.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::metrics::window::Window;

/// Timestamp format used by the sensor API, e.g. `05-Mar-2024 09:00:00`.
pub const TIMESTAMP_FORMAT: &str = "%d-%b-%Y %H:%M:%S";

/// The five measured quantities, in dashboard order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Parameter {
    Ph,
    Tds,
    Frc,
    Pressure,
    Flow,
}

impl Parameter {
    pub const ALL: [Parameter; 5] = [
        Parameter::Ph,
        Parameter::Tds,
        Parameter::Frc,
        Parameter::Pressure,
        Parameter::Flow,
    ];

    /// Column name in the API payload and the history export.
    pub fn column(self) -> &'static str {
        match self {
            Parameter::Ph => "source_pH",
            Parameter::Tds => "source_TDS",
            Parameter::Frc => "source_FRC",
            Parameter::Pressure => "source_pressure",
            Parameter::Flow => "source_flow",
        }
    }

    /// Short human label shown on cards and chart axes.
    pub fn label(self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Tds => "TDS",
            Parameter::Frc => "FRC",
            Parameter::Pressure => "pressure",
            Parameter::Flow => "flow",
        }
    }
}

/// One sensor sample. Unknown values are `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: Option<NaiveDateTime>,
    pub source_ph: Option<f64>,
    pub source_tds: Option<f64>,
    pub source_frc: Option<f64>,
    pub source_pressure: Option<f64>,
    pub source_flow: Option<f64>,
}

impl Reading {
    pub fn value(&self, param: Parameter) -> Option<f64> {
        match param {
            Parameter::Ph => self.source_ph,
            Parameter::Tds => self.source_tds,
            Parameter::Frc => self.source_frc,
            Parameter::Pressure => self.source_pressure,
            Parameter::Flow => self.source_flow,
        }
    }

    pub fn set_value(&mut self, param: Parameter, value: Option<f64>) {
        let slot = match param {
            Parameter::Ph => &mut self.source_ph,
            Parameter::Tds => &mut self.source_tds,
            Parameter::Frc => &mut self.source_frc,
            Parameter::Pressure => &mut self.source_pressure,
            Parameter::Flow => &mut self.source_flow,
        };
        *slot = value;
    }

    /// Calendar date of the reading in the series' implicit local time.
    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date())
    }
}

/// Readings sorted ascending by timestamp.
///
/// Readings with an unknown timestamp sort first and are skipped by every
/// time-ordered operation. Duplicate timestamps are tolerated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingSeries {
    readings: Vec<Reading>,
}

impl ReadingSeries {
    pub fn new(mut readings: Vec<Reading>) -> Self {
        // stable, so duplicates keep their arrival order
        readings.sort_by_key(|r| r.timestamp);
        Self { readings }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings with a known timestamp, in time order.
    pub fn timed(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter().filter(|r| r.timestamp.is_some())
    }

    /// Concatenates `other` onto this series, drops exact duplicates and
    /// re-sorts.
    pub fn merge(&self, other: &ReadingSeries) -> ReadingSeries {
        let mut combined = self.readings.clone();
        combined.extend(other.readings.iter().cloned());
        combined.sort_by_key(|r| r.timestamp);

        let mut deduped: Vec<Reading> = Vec::with_capacity(combined.len());
        for reading in combined {
            let seen = deduped
                .iter()
                .rev()
                .take_while(|kept| kept.timestamp == reading.timestamp)
                .any(|kept| kept == &reading);
            if !seen {
                deduped.push(reading);
            }
        }

        ReadingSeries { readings: deduped }
    }

    /// Readings falling on `date`.
    pub fn for_date(&self, date: NaiveDate) -> ReadingSeries {
        ReadingSeries {
            readings: self
                .readings
                .iter()
                .filter(|r| r.date() == Some(date))
                .cloned()
                .collect(),
        }
    }

    /// Readings whose timestamp lies in `window`.
    pub fn within(&self, window: &Window) -> ReadingSeries {
        ReadingSeries {
            readings: self
                .timed()
                .filter(|r| r.timestamp.is_some_and(|ts| window.contains(ts)))
                .cloned()
                .collect(),
        }
    }

    /// The last `n` readings.
    pub fn tail(&self, n: usize) -> &[Reading] {
        let start = self.readings.len().saturating_sub(n);
        &self.readings[start..]
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }

    /// Distinct calendar dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.timed().filter_map(Reading::date).collect();
        dates.dedup();
        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str, flow: Option<f64>) -> Reading {
        Reading {
            timestamp: Some(NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()),
            source_flow: flow,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_sorts_unknown_timestamps_first() {
        let series = ReadingSeries::new(vec![
            at("05-Mar-2024 10:00:00", Some(1.0)),
            Reading::default(),
            at("05-Mar-2024 09:00:00", Some(2.0)),
        ]);

        let readings = series.readings();
        assert!(readings[0].timestamp.is_none());
        assert_eq!(readings[1].source_flow, Some(2.0));
        assert_eq!(readings[2].source_flow, Some(1.0));
        assert_eq!(series.timed().count(), 2);
    }

    #[test]
    fn test_merge_drops_exact_duplicates_only() {
        let a = ReadingSeries::new(vec![
            at("05-Mar-2024 09:00:00", Some(1.0)),
            at("05-Mar-2024 09:10:00", Some(2.0)),
        ]);
        let b = ReadingSeries::new(vec![
            at("05-Mar-2024 09:10:00", Some(2.0)),
            at("05-Mar-2024 09:10:00", Some(3.0)),
        ]);

        let merged = a.merge(&b);
        assert_eq!(merged.len(), 3);

        let again = merged.merge(&b);
        assert_eq!(again, merged);
    }

    #[test]
    fn test_for_date_and_dates() {
        let series = ReadingSeries::new(vec![
            at("05-Mar-2024 23:59:59", Some(1.0)),
            at("06-Mar-2024 00:00:00", Some(2.0)),
            at("06-Mar-2024 08:00:00", Some(3.0)),
        ]);

        let day = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(series.for_date(day).len(), 2);
        assert_eq!(series.dates().len(), 2);
    }

    #[test]
    fn test_tail_and_latest() {
        let series = ReadingSeries::new(vec![
            at("05-Mar-2024 09:00:00", Some(1.0)),
            at("05-Mar-2024 09:10:00", Some(2.0)),
            at("05-Mar-2024 09:20:00", Some(3.0)),
        ]);

        assert_eq!(series.tail(2).len(), 2);
        assert_eq!(series.tail(10).len(), 3);
        assert_eq!(series.latest().and_then(|r| r.source_flow), Some(3.0));
        assert!(ReadingSeries::default().latest().is_none());
    }

    #[test]
    fn test_parameter_columns() {
        let mut reading = Reading::default();
        reading.set_value(Parameter::Tds, Some(120.0));
        assert_eq!(reading.value(Parameter::Tds), Some(120.0));
        assert_eq!(Parameter::Ph.column(), "source_pH");
        assert_eq!(Parameter::Pressure.label(), "pressure");
    }
}
