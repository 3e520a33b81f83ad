//! Output formatting and persistence for readings and daily metrics.
//!
//! Supports JSON serialization, the history-table CSV export and a
//! daily-metrics CSV holding one row per date.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metrics::DailyMetrics;
use crate::metrics::format::{format_duration, round_to};
use crate::model::{Reading, ReadingSeries};
use chrono::NaiveDate;
use csv::WriterBuilder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Timestamp layout used in exported files.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One row of the history table. Unknown values stay empty cells.
#[derive(Debug, Serialize)]
struct HistoryRow {
    timestamp: String,
    #[serde(rename = "source_pH")]
    source_ph: Option<f64>,
    #[serde(rename = "source_TDS")]
    source_tds: Option<f64>,
    #[serde(rename = "source_FRC")]
    source_frc: Option<f64>,
    source_pressure: Option<f64>,
    source_flow: Option<f64>,
}

impl From<&Reading> for HistoryRow {
    fn from(r: &Reading) -> Self {
        HistoryRow {
            timestamp: r
                .timestamp
                .map(|ts| ts.format(EXPORT_TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            source_ph: r.source_ph,
            source_tds: r.source_tds,
            source_frc: r.source_frc,
            source_pressure: r.source_pressure,
            source_flow: r.source_flow,
        }
    }
}

/// One row of the daily-metrics file.
#[derive(Debug, Serialize, Deserialize)]
struct DailyRow {
    date: String,
    pumping_time: String,
    pumping_secs: i64,
    flow_total_kl: f64,
    lpcd: f64,
}

impl From<&DailyMetrics> for DailyRow {
    fn from(m: &DailyMetrics) -> Self {
        DailyRow {
            date: m.date.format("%Y-%m-%d").to_string(),
            pumping_time: format_duration(m.pumping_duration),
            pumping_secs: m.pumping_duration.num_seconds(),
            flow_total_kl: round_to(m.flow_total, 3),
            lpcd: round_to(m.lpcd, 2),
        }
    }
}

/// Encodes the series as a history-table CSV.
pub fn history_csv(series: &ReadingSeries) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    for reading in series.readings() {
        writer.serialize(HistoryRow::from(reading))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV buffer: {}", e))
}

/// Writes the history table to `path`, gzip-compressed when `gzip` is set.
#[tracing::instrument(skip(series), fields(rows = series.len()))]
pub fn write_history(path: &str, series: &ReadingSeries, gzip: bool) -> Result<()> {
    let body = history_csv(series)?;
    let body = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body)?;
        encoder.finish()?
    } else {
        body
    };

    let mut file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    file.write_all(&body)?;
    info!(path, bytes = body.len(), "History export written");
    Ok(())
}

/// Merges `daily` into the CSV at `path`, one row per date.
///
/// Dates already in the file are replaced by the freshly computed row, so a
/// day still in progress is updated rather than repeated. Dates only present
/// in the file are kept. Rows are written in date order.
pub fn write_daily_records(path: &str, daily: &BTreeMap<NaiveDate, DailyMetrics>) -> Result<()> {
    let mut rows: BTreeMap<String, DailyRow> = BTreeMap::new();

    if Path::new(path).exists() {
        let file = File::open(path).with_context(|| format!("failed to open {path}"))?;
        let mut rdr = csv::Reader::from_reader(file);
        for result in rdr.deserialize() {
            let row: DailyRow = result.with_context(|| format!("malformed row in {path}"))?;
            rows.insert(row.date.clone(), row);
        }
    }
    let existing = rows.len();

    for metrics in daily.values() {
        let row = DailyRow::from(metrics);
        rows.insert(row.date.clone(), row);
    }
    debug!(path, existing, total = rows.len(), "Writing daily CSV");

    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for row in rows.values() {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TIMESTAMP_FORMAT;
    use chrono::{Duration, NaiveDateTime};
    use flate2::read::GzDecoder;
    use std::env;
    use std::fs;
    use std::io::Read;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_series() -> ReadingSeries {
        ReadingSeries::new(vec![
            Reading {
                timestamp: Some(
                    NaiveDateTime::parse_from_str("05-Mar-2024 09:00:00", TIMESTAMP_FORMAT).unwrap(),
                ),
                source_ph: Some(7.1),
                source_flow: Some(5.0),
                ..Default::default()
            },
            Reading {
                timestamp: Some(
                    NaiveDateTime::parse_from_str("05-Mar-2024 09:10:00", TIMESTAMP_FORMAT).unwrap(),
                ),
                source_tds: Some(110.0),
                ..Default::default()
            },
        ])
    }

    fn sample_day() -> DailyMetrics {
        DailyMetrics {
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            pumping_duration: Duration::minutes(20),
            flow_total: 50.0,
            lpcd: 5.0,
        }
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_day()).unwrap();
    }

    #[test]
    fn test_history_csv_unknown_values_are_empty() {
        let body = String::from_utf8(history_csv(&sample_series()).unwrap()).unwrap();
        let lines: Vec<_> = body.lines().collect();

        assert_eq!(
            lines[0],
            "timestamp,source_pH,source_TDS,source_FRC,source_pressure,source_flow"
        );
        assert_eq!(lines[1], "2024-03-05 09:00:00,7.1,,,,5.0");
        assert_eq!(lines[2], "2024-03-05 09:10:00,,110.0,,,");
    }

    #[test]
    fn test_write_history_gzip_round_trips() {
        let path = temp_path("water_metrics_test_history.csv.gz");
        let _ = fs::remove_file(&path);

        write_history(&path, &sample_series(), true).unwrap();

        let mut decoded = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.starts_with("timestamp,source_pH"));
        assert_eq!(decoded.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    fn day(d: u32, minutes: i64, flow: f64) -> (NaiveDate, DailyMetrics) {
        let date = NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let metrics = DailyMetrics {
            date,
            pumping_duration: Duration::minutes(minutes),
            flow_total: flow,
            lpcd: flow / 10.0,
        };
        (date, metrics)
    }

    #[test]
    fn test_write_daily_records_one_row_per_date() {
        let path = temp_path("water_metrics_test_daily_rows.csv");
        let _ = fs::remove_file(&path);

        let daily: BTreeMap<_, _> = [sample_day()].map(|m| (m.date, m)).into_iter().collect();
        write_daily_records(&path, &daily).unwrap();
        write_daily_records(&path, &daily).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("date,")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("2024-03-05,00:20:00,1200,50.0,5.0"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_daily_records_replaces_in_progress_day() {
        let path = temp_path("water_metrics_test_daily_replace.csv");
        let _ = fs::remove_file(&path);

        let morning: BTreeMap<_, _> = [day(4, 60, 30.0), day(5, 10, 5.0)].into_iter().collect();
        write_daily_records(&path, &morning).unwrap();

        // a later fetch no longer carries the 4th and has more of the 5th
        let evening: BTreeMap<_, _> = [day(5, 40, 20.0), day(6, 0, 0.0)].into_iter().collect();
        write_daily_records(&path, &evening).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("2024-03-04,01:00:00,3600,30.0,"));
        assert!(lines[2].starts_with("2024-03-05,00:40:00,2400,20.0,"));
        assert!(lines[3].starts_with("2024-03-06,"));

        fs::remove_file(&path).unwrap();
    }
}
