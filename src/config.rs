//! Dashboard configuration.
//!
//! One JSON file describes a deployment: the site title, which logos to
//! show, whether a login gate fronts the page, the map provider and the
//! population served. Every field has a default, so `{}` is a valid config:
//! ```json
//! {
//!   "title": "Water Monitoring Unit",
//!   "subtitle": "Dadpur",
//!   "logo_set": ["assets/logo.png", "assets/itc.png"],
//!   "requires_login": false,
//!   "map_provider": "osm",
//!   "population": 10000
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;
use crate::metrics::Population;

/// Chart history shown by default (one day at the usual sample rate).
pub const DEFAULT_CHART_POINTS: usize = 180;

/// Poll interval of the live dashboard.
pub const DEFAULT_REFRESH_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapProvider {
    #[default]
    Osm,
    Google,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub subtitle: Option<String>,
    pub logo_set: Vec<String>,
    pub requires_login: bool,
    pub map_provider: MapProvider,
    pub population: Population,
    pub chart_points: usize,
    pub refresh_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Water Monitoring Unit".to_string(),
            subtitle: None,
            logo_set: vec!["assets/logo.png".to_string()],
            requires_login: false,
            map_provider: MapProvider::default(),
            population: Population::default(),
            chart_points: DEFAULT_CHART_POINTS,
            refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl DashboardConfig {
    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read config {path}"))?;
        let config: DashboardConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {path}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MetricsError> {
        if self.chart_points == 0 {
            return Err(invalid("chart_points", "must be at least 1"));
        }
        if self.refresh_secs == 0 {
            return Err(invalid("refresh_secs", "must be at least 1"));
        }
        if self.title.trim().is_empty() {
            return Err(invalid("title", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> MetricsError {
    MetricsError::InvalidConfig {
        field: field.to_string(),
        message: message.to_string(),
    }
}
