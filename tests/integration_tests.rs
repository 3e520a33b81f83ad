use chrono::{Duration, NaiveDate, NaiveDateTime};
use water_metrics::config::DashboardConfig;
use water_metrics::dashboard::DashboardSnapshot;
use water_metrics::ingest::parse_readings;
use water_metrics::metrics::{
    AggregatorOptions, Population, TrailingInterval, Window, daily_metrics, weekly_lpcd,
    window_stats,
};
use water_metrics::model::TIMESTAMP_FORMAT;
use water_metrics::output::write_daily_records;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
}

#[test]
fn test_full_pipeline() {
    let bytes = include_bytes!("fixtures/readings.json");
    let series = parse_readings(bytes).expect("Failed to parse fixture");
    assert_eq!(series.len(), 10);
    assert_eq!(series.timed().count(), 9);

    let daily = daily_metrics(&series, Population::default(), AggregatorOptions::default());
    assert_eq!(daily.len(), 3);

    // pumping open at midnight contributes nothing to either day
    assert_eq!(daily[&date(4)].pumping_duration, Duration::zero());
    assert_eq!(daily[&date(4)].flow_total, 12.0);

    assert_eq!(daily[&date(5)].pumping_duration, Duration::minutes(20));
    assert_eq!(daily[&date(5)].flow_total, 10.0);
    assert_eq!(daily[&date(5)].lpcd, 1.0);

    assert_eq!(daily[&date(6)].pumping_duration, Duration::hours(1));
    assert_eq!(daily[&date(6)].lpcd, 4.0);

    let weekly = weekly_lpcd(&daily, date(6)).unwrap();
    assert!((weekly - (1.2 + 1.0 + 4.0) / 3.0).abs() < 1e-9);
}

#[test]
fn test_trailing_close_option_on_fixture() {
    let series = parse_readings(include_bytes!("fixtures/readings.json")).unwrap();
    let options = AggregatorOptions {
        trailing: TrailingInterval::CloseAtLastReading,
        ..Default::default()
    };

    let daily = daily_metrics(&series, Population::default(), options);
    assert_eq!(daily[&date(4)].pumping_duration, Duration::minutes(10));
    assert_eq!(daily[&date(5)].pumping_duration, Duration::minutes(20));
}

#[test]
fn test_window_stats_on_fixture() {
    let series = parse_readings(include_bytes!("fixtures/readings.json")).unwrap();

    let morning = Window::new(ts("05-Mar-2024 09:00:00"), ts("05-Mar-2024 12:00:00")).unwrap();
    let stats = window_stats(&series, &morning);
    assert_eq!(stats.samples, 3);
    assert_eq!(stats.mean_tds, Some(110.0));

    let noon = Window::new(ts("05-Mar-2024 12:00:00"), ts("05-Mar-2024 13:00:00")).unwrap();
    let stats = window_stats(&series, &noon);
    assert_eq!(stats.samples, 1);
    assert_eq!(stats.mean_tds, None);
    assert_eq!(stats.mean_ph, Some(7.5));
}

#[test]
fn test_snapshot_on_fixture() {
    let series = parse_readings(include_bytes!("fixtures/readings.json")).unwrap();
    let config = DashboardConfig {
        population: Population::new(5_000).unwrap(),
        ..Default::default()
    };

    let snapshot = DashboardSnapshot::from_series(&series, &config, AggregatorOptions::default());

    assert_eq!(snapshot.latest_at, Some(ts("06-Mar-2024 08:00:00")));
    assert_eq!(snapshot.daily.len(), 3);
    assert_eq!(snapshot.kpis[2].value, Some(8.0));
    assert_eq!(snapshot.today_stats.unwrap().samples, 2);
}

#[test]
fn test_merge_of_repeated_fetch_is_stable() {
    let first = parse_readings(include_bytes!("fixtures/readings.json")).unwrap();
    let second = parse_readings(include_bytes!("fixtures/readings.json")).unwrap();

    let merged = first.merge(&second);
    assert_eq!(merged, first);
}

#[test]
fn test_daily_export_twice_keeps_one_row_per_date() {
    let series = parse_readings(include_bytes!("fixtures/readings.json")).unwrap();
    let daily = daily_metrics(&series, Population::default(), AggregatorOptions::default());
    let path = format!(
        "{}/water_metrics_it_daily.csv",
        std::env::temp_dir().display()
    );
    let _ = std::fs::remove_file(&path);

    write_daily_records(&path, &daily).unwrap();
    write_daily_records(&path, &daily).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "date,pumping_time,pumping_secs,flow_total_kl,lpcd");
    for (line, day) in lines[1..].iter().zip(["2024-03-04", "2024-03-05", "2024-03-06"]) {
        assert!(line.starts_with(day), "{line}");
    }
    assert!(lines[2].starts_with("2024-03-05,00:20:00,1200,10.0,1.0"));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_single_day_report_on_fixture() {
    let series = parse_readings(include_bytes!("fixtures/readings.json")).unwrap();
    let day = series.for_date(date(6));
    assert!(day.timed().all(|r| r.date() == Some(date(6))));

    let daily = daily_metrics(&day, Population::default(), AggregatorOptions::default());
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[&date(6)].pumping_duration, Duration::hours(1));
    assert_eq!(daily[&date(6)].flow_total, 40.0);
    assert_eq!(daily[&date(6)].lpcd, 4.0);
}
