use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized reading in entity-attribute-value form, the sole durable
/// output of the core.
///
/// Rows are constructed once, immutably, and handed to the caller; the sink
/// upserts them keyed by `(timestamp, sensor_id, metric_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRow {
    /// Reading instant, always materialized in UTC.
    pub timestamp: DateTime<Utc>,
    /// Canonical sensor identity, colon-free and never empty.
    pub sensor_id: String,
    pub metric_name: String,
    /// Metric value rounded to the configured precision.
    pub metric_value: f64,
    /// Logical sensor class; falls back to the ingesting channel or
    /// collection name when the payload carries none.
    pub sensor_kind: String,
}

/// Canonical form of a sensor id: colon separators (the common MAC-address
/// notation) are stripped.
pub fn canonical_sensor_id(raw: &str) -> String {
    raw.replace(':', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_id_strips_colons() {
        assert_eq!(canonical_sensor_id("AA:BB:CC"), "AABBCC");
        assert_eq!(canonical_sensor_id("sensor::001::AA"), "sensor001AA");
    }

    #[test]
    fn canonical_id_leaves_other_characters() {
        assert_eq!(canonical_sensor_id("sensor_ñ_001"), "sensor_ñ_001");
    }
}
