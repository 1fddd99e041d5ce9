use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::alias::{FieldAliasTable, FieldRole};
use crate::config::NormalizerConfig;
use crate::error::{NormalizeError, NormalizeResult};
use crate::rows::MetricRowBuilder;
use crate::shape;
use crate::timestamp::{DefaultTimestamp, TimestampResolver, TimestampValue};
use crate::types::{canonical_sensor_id, SensorRow};
use crate::unwrap;

/// Per-call inputs that vary by ingestion path.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Sensor kind used when the reading itself carries none; callers pass
    /// the ingesting channel or collection name.
    pub kind_default: String,
    /// Timestamp candidate decoded by the collaborator layer (document
    /// timestamps, document-id timestamps).
    pub supplied_timestamp: Option<TimestampValue>,
    /// What to do when no timestamp resolves at all.
    pub default_timestamp: DefaultTimestamp,
    /// Injected current time, so normalization stays referentially
    /// transparent and testable.
    pub now: DateTime<Utc>,
}

impl NormalizeOptions {
    pub fn new(kind_default: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind_default: kind_default.into(),
            supplied_timestamp: None,
            default_timestamp: DefaultTimestamp::CurrentTime,
            now,
        }
    }
}

/// The normalization pipeline: classifies the payload shape, unwraps nested
/// wrappers, resolves the base instant, and expands each metric into rows.
///
/// Pure and side-effect free — no I/O, no cross-call state; safe to share
/// across tasks. One malformed reading inside a batch never aborts the
/// batch, and no failure escapes past this boundary: the only observable
/// outcome is the (possibly empty) row vector.
pub struct Normalizer {
    aliases: FieldAliasTable,
    resolver: TimestampResolver,
    builder: MetricRowBuilder,
    max_unwrap_depth: usize,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        let resolver = TimestampResolver::new(config.local_zone, config.aliases.clone());
        let builder = MetricRowBuilder::new(config.value_precision, config.list_interval());
        Self {
            aliases: config.aliases,
            resolver,
            builder,
            max_unwrap_depth: config.max_unwrap_depth,
        }
    }

    /// Entry point for the webhook path: wall-clock `now`, current-time
    /// defaulting, no collaborator timestamp.
    pub fn normalize(&self, payload: &Value, kind_default: &str) -> Vec<SensorRow> {
        self.normalize_with(payload, &NormalizeOptions::new(kind_default, Utc::now()))
    }

    pub fn normalize_with(&self, payload: &Value, options: &NormalizeOptions) -> Vec<SensorRow> {
        match payload {
            Value::Object(map) if !map.is_empty() => self.normalize_object(map, options),
            Value::Array(readings) => self.normalize_readings(readings, options),
            _ => Vec::new(),
        }
    }

    fn normalize_object(
        &self,
        payload: &Map<String, Value>,
        options: &NormalizeOptions,
    ) -> Vec<SensorRow> {
        let explicit_id = self
            .aliases
            .first_present(payload, FieldRole::Identity)
            .and_then(Value::as_str)
            .map(canonical_sensor_id);

        if !shape::payload_is_nested(payload) {
            // Flat: the payload itself is the metric mapping.
            let Some(sensor_id) = explicit_id else {
                debug!("flat payload carries no identity field, discarding");
                return Vec::new();
            };
            return self.normalize_reading_isolated(payload, &sensor_id, None, options);
        }

        // The wrapper key may itself be the reading timestamp rather than a
        // sensor id.
        let structural_hint = payload
            .keys()
            .next()
            .and_then(|key| self.resolver.parse_text(key));

        let unwrapped =
            match unwrap::extract_identity_and_metrics(payload, self.max_unwrap_depth) {
                Ok(unwrapped) => Some(unwrapped),
                Err(error) => {
                    debug!(%error, "nested payload did not unwrap");
                    None
                }
            };

        // An explicit identity field wins over the structurally derived one.
        let structural_id = unwrapped.as_ref().map(|u| u.sensor_id.clone());
        let Some(sensor_id) = explicit_id.or(structural_id) else {
            debug!("no sensor identity resolved, discarding payload");
            return Vec::new();
        };
        let Some(unwrapped) = unwrapped else {
            return Vec::new();
        };

        self.normalize_reading_isolated(&unwrapped.metrics, &sensor_id, structural_hint, options)
    }

    /// A top-level array is a batch of independent reading objects, each
    /// carrying its own identity field.
    fn normalize_readings(&self, readings: &[Value], options: &NormalizeOptions) -> Vec<SensorRow> {
        readings
            .iter()
            .flat_map(|reading| match reading {
                Value::Object(map) => {
                    let sensor_id = self
                        .aliases
                        .first_present(map, FieldRole::Identity)
                        .and_then(Value::as_str)
                        .map(canonical_sensor_id);
                    match sensor_id {
                        Some(sensor_id) => {
                            self.normalize_reading_isolated(map, &sensor_id, None, options)
                        }
                        None => {
                            debug!("batch reading carries no identity field, skipping");
                            Vec::new()
                        }
                    }
                }
                other => {
                    warn!(kind = %json_kind(other), "batch reading is not an object, skipping");
                    Vec::new()
                }
            })
            .collect()
    }

    /// Per-item failure isolation: whatever goes wrong with one reading is
    /// logged and swallowed so the rest of the batch still produces rows.
    fn normalize_reading_isolated(
        &self,
        reading: &Map<String, Value>,
        sensor_id: &str,
        structural_hint: Option<DateTime<Utc>>,
        options: &NormalizeOptions,
    ) -> Vec<SensorRow> {
        match self.normalize_reading(reading, sensor_id, structural_hint, options) {
            Ok(rows) => rows,
            Err(error) => {
                warn!(sensor_id, %error, "skipping reading");
                Vec::new()
            }
        }
    }

    fn normalize_reading(
        &self,
        reading: &Map<String, Value>,
        sensor_id: &str,
        structural_hint: Option<DateTime<Utc>>,
        options: &NormalizeOptions,
    ) -> NormalizeResult<Vec<SensorRow>> {
        let base_timestamp = self
            .resolver
            .resolve(
                reading,
                options.supplied_timestamp.as_ref(),
                structural_hint,
                options.default_timestamp,
                options.now,
            )
            .ok_or(NormalizeError::UnresolvableTimestamp)?;

        let sensor_kind = self
            .aliases
            .first_present(reading, FieldRole::Kind)
            .and_then(Value::as_str)
            .unwrap_or(&options.kind_default);

        let mut rows = Vec::new();
        for (metric_name, metric_value) in reading
            .iter()
            .filter(|(key, _)| !self.aliases.is_reserved(key))
        {
            rows.extend(self.builder.build_rows(
                metric_name,
                metric_value,
                sensor_id,
                sensor_kind,
                base_timestamp,
            ));
        }

        debug!(sensor_id, rows = rows.len(), "normalized reading");
        Ok(rows)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
