//! Typed errors for the metrics core and the ingestion boundary.
//!
//! "No data" is never an error here: empty inputs produce `None` or empty
//! maps. These variants cover operator mistakes and malformed payloads.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Invalid configuration handed to the aggregator.
#[derive(Debug, Error, PartialEq)]
pub enum MetricsError {
    #[error("population must be positive, got {0}")]
    InvalidPopulation(i64),

    #[error("window start {start} is after end {end}")]
    InvalidWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("invalid config field `{field}`: {message}")]
    InvalidConfig { field: String, message: String },
}

/// Payloads the ingestion layer refuses to normalize.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("expected a JSON list or object, got {0}")]
    UnexpectedShape(&'static str),

    #[error("response body is not valid JSON")]
    Json(#[from] serde_json::Error),
}
