use serde_json::{Map, Value};

/// Whether a single value wraps further structure: an object, or a string
/// that itself decodes to a JSON object. Malformed JSON fails closed.
pub fn value_looks_nested(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::String(text) => {
            matches!(serde_json::from_str::<Value>(text), Ok(Value::Object(_)))
        }
        _ => false,
    }
}

/// A payload is nested if **any** top-level value looks nested. Producers
/// mix identity-wrapper fields with plain metric fields in the same object,
/// hence any rather than all.
pub fn payload_is_nested(payload: &Map<String, Value>) -> bool {
    payload.values().any(value_looks_nested)
}
