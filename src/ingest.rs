//! Normalizes raw sensor API payloads into a [`ReadingSeries`].

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::model::{Parameter, Reading, ReadingSeries, TIMESTAMP_FORMAT};

/// Decodes a JSON payload (a list of records or a single record) into a
/// sorted [`ReadingSeries`].
///
/// Missing columns and values that are not numeric become `None`. A
/// timestamp that does not match [`TIMESTAMP_FORMAT`] becomes `None`.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON, or if the top-level value is
/// neither an array nor an object.
pub fn parse_readings(bytes: &[u8]) -> Result<ReadingSeries, IngestError> {
    let value: Value = serde_json::from_slice(bytes)?;
    normalize(value)
}

/// Same as [`parse_readings`] for an already-decoded value.
pub fn normalize(value: Value) -> Result<ReadingSeries, IngestError> {
    let records = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        Value::Null => return Err(IngestError::UnexpectedShape("null")),
        Value::Bool(_) => return Err(IngestError::UnexpectedShape("bool")),
        Value::Number(_) => return Err(IngestError::UnexpectedShape("number")),
        Value::String(_) => return Err(IngestError::UnexpectedShape("string")),
    };

    let mut missing = [false; 5];
    let mut readings = Vec::with_capacity(records.len());

    for record in records {
        let Value::Object(fields) = record else {
            debug!("Skipping non-object record");
            continue;
        };

        for (i, param) in Parameter::ALL.iter().enumerate() {
            if !fields.contains_key(param.column()) {
                missing[i] = true;
            }
        }

        readings.push(to_reading(&fields));
    }

    for (i, param) in Parameter::ALL.iter().enumerate() {
        if missing[i] {
            warn!(column = param.column(), "Missing column in some records");
        }
    }

    Ok(ReadingSeries::new(readings))
}

fn to_reading(fields: &Map<String, Value>) -> Reading {
    let mut reading = Reading {
        timestamp: fields.get("timestamp").and_then(parse_timestamp),
        ..Default::default()
    };

    for param in Parameter::ALL {
        reading.set_value(param, fields.get(param.column()).and_then(coerce_number));
    }

    reading
}

fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    let raw = value.as_str()?;
    match NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT) {
        Ok(ts) => Some(ts),
        Err(e) => {
            debug!(raw, error = %e, "Unparseable timestamp");
            None
        }
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let parsed = s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
            if parsed.is_none() {
                debug!(raw = %s, "Non-numeric value");
            }
            parsed
        }
        _ => None,
    }
}
