use serde_json::{Map, Value};

use crate::error::{NormalizeError, NormalizeResult};
use crate::types::canonical_sensor_id;

/// Result of unwrapping a nested payload down to its terminal shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Unwrapped {
    /// Wrapper key of the terminal object, colon-stripped.
    pub sensor_id: String,
    /// The terminal metric mapping; every value in it is an array.
    pub metrics: Map<String, Value>,
}

/// Descend through JSON-string layers and wrapper objects until the
/// terminal shape: an object whose every value is an array (the canonical
/// time-series-of-readings form).
///
/// Wrapper objects carry exactly one meaningful top-level key in the nested
/// case, so only the first key is followed. Descent is bounded by
/// `max_depth`; pathological input yields an error, never a stack overflow.
pub fn extract_identity_and_metrics(
    payload: &Map<String, Value>,
    max_depth: usize,
) -> NormalizeResult<Unwrapped> {
    descend(payload, max_depth, 0)
}

fn descend(
    payload: &Map<String, Value>,
    max_depth: usize,
    depth: usize,
) -> NormalizeResult<Unwrapped> {
    if depth >= max_depth {
        return Err(NormalizeError::RecursionLimitExceeded { max_depth });
    }

    let (key, value) = payload
        .iter()
        .next()
        .ok_or(NormalizeError::UnresolvableIdentity)?;

    match value {
        // A string layer must decode to JSON; rewrap under the same key and
        // keep descending.
        Value::String(text) => {
            let parsed: Value = serde_json::from_str(text)?;
            let mut rewrapped = Map::new();
            rewrapped.insert(key.clone(), parsed);
            descend(&rewrapped, max_depth, depth + 1)
        }
        Value::Object(inner) => {
            if inner.values().all(Value::is_array) {
                Ok(Unwrapped {
                    sensor_id: canonical_sensor_id(key),
                    metrics: inner.clone(),
                })
            } else {
                // Not yet terminal: drop the wrapping key and look inside.
                descend(inner, max_depth, depth + 1)
            }
        }
        _ => Err(NormalizeError::UnresolvableIdentity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MAX_DEPTH: usize = 8;

    fn unwrap_payload(value: Value) -> NormalizeResult<Unwrapped> {
        extract_identity_and_metrics(value.as_object().unwrap(), MAX_DEPTH)
    }

    #[test]
    fn terminal_shape_yields_key_and_metrics() {
        let result = unwrap_payload(json!({
            "sensor_001": {
                "temperature": [20.0, 21.0],
                "humidity": [60.0, 61.0],
            }
        }))
        .unwrap();

        assert_eq!(result.sensor_id, "sensor_001");
        assert_eq!(result.metrics.len(), 2);
        assert_eq!(result.metrics["temperature"], json!([20.0, 21.0]));
    }

    #[test]
    fn wrapper_key_colons_are_stripped() {
        let result = unwrap_payload(json!({
            "AA:BB:CC": {"temperature": [21.0]}
        }))
        .unwrap();
        assert_eq!(result.sensor_id, "AABBCC");
    }

    #[test]
    fn extra_wrapper_levels_are_descended() {
        let result = unwrap_payload(json!({
            "outer": {
                "sensor_001": {"temperature": [20.0, 21.0]}
            }
        }))
        .unwrap();
        assert_eq!(result.sensor_id, "sensor_001");
        assert_eq!(result.metrics["temperature"], json!([20.0, 21.0]));
    }

    #[test]
    fn json_string_layer_is_decoded() {
        let inner = json!({"temperature": [20.0, 21.0]}).to_string();
        let result = unwrap_payload(json!({ "sensor_001": inner })).unwrap();
        assert_eq!(result.sensor_id, "sensor_001");
        assert_eq!(result.metrics["temperature"], json!([20.0, 21.0]));
    }

    #[test]
    fn non_json_string_is_malformed_encoding() {
        let result = unwrap_payload(json!({"key": "not json"}));
        assert!(matches!(result, Err(NormalizeError::MalformedEncoding(_))));
    }

    #[test]
    fn scalar_value_is_unresolvable() {
        let result = unwrap_payload(json!({"key": 42}));
        assert!(matches!(result, Err(NormalizeError::UnresolvableIdentity)));
    }

    #[test]
    fn depth_bound_is_enforced() {
        // Build a wrapper deeper than the bound.
        let mut value = json!({"temperature": "not an array"});
        for i in 0..10 {
            let mut wrapper = Map::new();
            wrapper.insert(format!("level_{i}"), value);
            value = Value::Object(wrapper);
        }
        let result = unwrap_payload(value);
        assert!(matches!(
            result,
            Err(NormalizeError::RecursionLimitExceeded { max_depth: MAX_DEPTH })
        ));
    }

    #[test]
    fn nested_string_layers_count_toward_the_bound() {
        // Each string layer re-enters the decoder; two layers stay in bound.
        let inner = json!({"temperature": [20.0]}).to_string();
        let middle = json!({ "sensor_001": inner }).to_string();
        let result = unwrap_payload(json!({ "wrapper": middle })).unwrap();
        assert_eq!(result.sensor_id, "sensor_001");
    }

    #[test]
    fn empty_terminal_object_yields_empty_metrics() {
        // Vacuously all-arrays: the wrapper key still resolves.
        let result = unwrap_payload(json!({"sensor_001": {}})).unwrap();
        assert_eq!(result.sensor_id, "sensor_001");
        assert!(result.metrics.is_empty());
    }
}
