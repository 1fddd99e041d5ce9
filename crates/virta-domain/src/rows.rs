use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::warn;

use crate::error::{NormalizeError, NormalizeResult};
use crate::types::SensorRow;

/// Expands one metric-name/value pair into zero or more normalized rows.
#[derive(Debug, Clone)]
pub struct MetricRowBuilder {
    precision: u32,
    list_interval: Duration,
}

impl MetricRowBuilder {
    pub fn new(precision: u32, list_interval: Duration) -> Self {
        Self {
            precision,
            list_interval,
        }
    }

    /// Build rows for one metric.
    ///
    /// Scalar values produce one row at the base timestamp. Array values
    /// are read in reverse — the last element is the most recent reading —
    /// and element `i` from the end is stamped `base − i × interval`, so a
    /// single delivery can carry a backlog of evenly spaced samples.
    /// Null/empty values and values that cannot be coerced produce nothing.
    pub fn build_rows(
        &self,
        metric_name: &str,
        metric_value: &Value,
        sensor_id: &str,
        sensor_kind: &str,
        base_timestamp: DateTime<Utc>,
    ) -> Vec<SensorRow> {
        if is_empty_value(metric_value) {
            return Vec::new();
        }

        match metric_value {
            Value::Array(items) => items
                .iter()
                .rev()
                .enumerate()
                .filter_map(|(offset, item)| {
                    let timestamp = base_timestamp - self.list_interval * offset as i32;
                    self.build_scalar(metric_name, item, sensor_id, sensor_kind, timestamp)
                })
                .collect(),
            scalar => self
                .build_scalar(metric_name, scalar, sensor_id, sensor_kind, base_timestamp)
                .into_iter()
                .collect(),
        }
    }

    fn build_scalar(
        &self,
        metric_name: &str,
        value: &Value,
        sensor_id: &str,
        sensor_kind: &str,
        timestamp: DateTime<Utc>,
    ) -> Option<SensorRow> {
        if is_empty_value(value) {
            return None;
        }
        match coerce_numeric(metric_name, value) {
            Ok(number) => Some(SensorRow {
                timestamp,
                sensor_id: sensor_id.to_string(),
                metric_name: metric_name.to_string(),
                metric_value: round_to(number, self.precision),
                sensor_kind: sensor_kind.to_string(),
            }),
            Err(error) => {
                warn!(metric = metric_name, %error, "dropping metric row");
                None
            }
        }
    }
}

/// Null, empty string, and empty array/object values carry no reading.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Coerce a scalar to `f64`: numbers as-is, numeric text parsed, booleans
/// as 0/1. Everything else is an invalid metric value.
fn coerce_numeric(metric: &str, value: &Value) -> NormalizeResult<f64> {
    let invalid = || NormalizeError::InvalidMetricValue {
        metric: metric.to_string(),
    };
    match value {
        Value::Number(number) => number.as_f64().ok_or_else(invalid),
        Value::String(text) => text.trim().parse::<f64>().map_err(|_| invalid()),
        Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        _ => Err(invalid()),
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
