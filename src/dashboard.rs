//! Render-ready dashboard state.
//!
//! A [`DashboardSnapshot`] carries everything a front end needs to draw one
//! refresh of the page: branding from [`DashboardConfig`], latest-value
//! cards, chart series, delivery KPIs and the day's quality means. A single
//! parameterized config covers every site deployment.

use chrono::{DateTime, Days, NaiveDateTime, Utc};
use serde::Serialize;

use crate::config::{DashboardConfig, MapProvider};
use crate::metrics::format::{duration_hours, format_duration, format_optional};
use crate::metrics::{
    AggregatorOptions, DailyMetrics, Window, WindowStats, daily_metrics, weekly_lpcd, window_stats,
};
use crate::model::{Parameter, ReadingSeries};

pub const NO_DATA_MESSAGE: &str = "No data available. Please check the API connection.";

/// Card text shown when the refresh itself failed.
pub const ERROR_DISPLAY: &str = "Error";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub label: String,
    pub value: Option<f64>,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub parameter: &'static str,
    pub title: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub title: String,
    pub subtitle: Option<String>,
    pub logo_set: Vec<String>,
    pub requires_login: bool,
    pub map_provider: MapProvider,

    pub error_message: Option<String>,
    pub latest_at: Option<NaiveDateTime>,

    // latest values and delivery KPIs
    pub cards: Vec<Card>,
    pub kpis: Vec<Card>,

    pub charts: Vec<ChartSeries>,
    pub daily: Vec<DailyMetrics>,
    pub weekly_lpcd: Option<f64>,
    pub today_stats: Option<WindowStats>,
}

impl DashboardSnapshot {
    /// Builds a snapshot from a fresh series. The reference day for KPIs is
    /// the date of the most recent timed reading.
    pub fn from_series(
        series: &ReadingSeries,
        config: &DashboardConfig,
        options: AggregatorOptions,
    ) -> Self {
        let mut s = Self::empty(config);

        let Some(latest_ts) = series.timed().last().and_then(|r| r.timestamp) else {
            s.error_message = Some(NO_DATA_MESSAGE.to_string());
            s.cards = latest_cards(None);
            return s;
        };

        s.latest_at = Some(latest_ts);
        s.cards = latest_cards(series.latest().map(|r| Parameter::ALL.map(|p| r.value(p))));

        let tail = series.tail(config.chart_points);
        s.charts = Parameter::ALL
            .iter()
            .map(|&param| ChartSeries {
                parameter: param.label(),
                title: format!("Source {} over Time", param.label()),
                points: tail
                    .iter()
                    .filter_map(|r| {
                        r.timestamp.map(|timestamp| ChartPoint {
                            timestamp,
                            value: r.value(param),
                        })
                    })
                    .collect(),
            })
            .collect();

        let daily = daily_metrics(series, config.population, options);
        let today = latest_ts.date();
        s.weekly_lpcd = weekly_lpcd(&daily, today);

        let today_metrics = daily.get(&today);
        s.kpis = vec![
            Card {
                label: "Pumping time today".to_string(),
                value: today_metrics.map(|m| duration_hours(m.pumping_duration)),
                display: today_metrics
                    .map(|m| format_duration(m.pumping_duration))
                    .unwrap_or_else(|| "N/A".to_string()),
            },
            card("Flow today (kL)", today_metrics.map(|m| m.flow_total)),
            card("LPCD today", today_metrics.map(|m| m.lpcd)),
            card("LPCD weekly average", s.weekly_lpcd),
        ];

        let start = today.and_hms_opt(0, 0, 0);
        let end = today
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0));
        if let (Some(start), Some(end)) = (start, end) {
            s.today_stats = Window::new(start, end)
                .ok()
                .map(|window| window_stats(series, &window));
        }

        s.daily = daily.into_values().collect();
        s
    }

    /// Snapshot for a refresh that failed before any data arrived. Every
    /// card reads "Error" rather than "N/A".
    pub fn from_error(config: &DashboardConfig, message: &str) -> Self {
        let mut s = Self::empty(config);
        s.error_message = Some(format!("An error occurred: {message}"));
        s.cards = error_cards();
        s
    }

    fn empty(config: &DashboardConfig) -> Self {
        DashboardSnapshot {
            generated_at: Utc::now(),
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            logo_set: config.logo_set.clone(),
            requires_login: config.requires_login,
            map_provider: config.map_provider,
            error_message: None,
            latest_at: None,
            cards: Vec::new(),
            kpis: Vec::new(),
            charts: Vec::new(),
            daily: Vec::new(),
            weekly_lpcd: None,
            today_stats: None,
        }
    }
}

fn card(label: &str, value: Option<f64>) -> Card {
    Card {
        label: label.to_string(),
        value,
        display: format_optional(value, 2),
    }
}

fn latest_cards(values: Option<[Option<f64>; 5]>) -> Vec<Card> {
    let values = values.unwrap_or([None; 5]);
    Parameter::ALL
        .iter()
        .zip(values)
        .map(|(param, value)| card(&format!("Source {}", param.label()), value))
        .collect()
}

fn error_cards() -> Vec<Card> {
    Parameter::ALL
        .iter()
        .map(|param| Card {
            label: format!("Source {}", param.label()),
            value: None,
            display: ERROR_DISPLAY.to_string(),
        })
        .collect()
}
