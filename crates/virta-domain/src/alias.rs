use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Semantic role a literal payload key resolves to.
///
/// Every key maps to at most one role; anything not matching a known alias
/// is a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Identity,
    Timestamp,
    Kind,
    Metric,
}

/// Maps semantic roles to the literal key names recognized for that role.
///
/// Producers are inconsistent about how they spell "which sensor" and
/// "when", so the recognized spellings are configuration data rather than
/// code: deployments extend the lists without touching the scanning logic,
/// and tests can enumerate every alias exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAliasTable {
    /// Keys naming the sensor identity, in priority order.
    #[serde(default = "default_identity_aliases")]
    pub identity: Vec<String>,
    /// Keys naming the reading timestamp, in priority order.
    #[serde(default = "default_timestamp_aliases")]
    pub timestamp: Vec<String>,
    /// Keys naming the logical sensor class.
    #[serde(default = "default_kind_aliases")]
    pub kind: Vec<String>,
}

fn default_identity_aliases() -> Vec<String> {
    [
        "sensor_id", "id", "sensorId", "device_id", "deviceId", "sensorID", "SensorID",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_timestamp_aliases() -> Vec<String> {
    ["timestamp", "time", "date", "datetime", "SensorReadingTime"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_kind_aliases() -> Vec<String> {
    vec!["sensor_type".to_string()]
}

impl Default for FieldAliasTable {
    fn default() -> Self {
        Self {
            identity: default_identity_aliases(),
            timestamp: default_timestamp_aliases(),
            kind: default_kind_aliases(),
        }
    }
}

impl FieldAliasTable {
    /// Resolve the role of a literal key.
    pub fn role_of(&self, key: &str) -> FieldRole {
        if self.identity.iter().any(|a| a == key) {
            FieldRole::Identity
        } else if self.timestamp.iter().any(|a| a == key) {
            FieldRole::Timestamp
        } else if self.kind.iter().any(|a| a == key) {
            FieldRole::Kind
        } else {
            FieldRole::Metric
        }
    }

    /// Keys reserved for identity/timestamp/kind are excluded from metric
    /// extraction.
    pub fn is_reserved(&self, key: &str) -> bool {
        self.role_of(key) != FieldRole::Metric
    }

    /// First alias of `role` structurally present in `item`, scanning in
    /// declared priority order. Null and empty-string values do not count
    /// as present.
    pub fn first_present<'a>(
        &self,
        item: &'a Map<String, Value>,
        role: FieldRole,
    ) -> Option<&'a Value> {
        let aliases = match role {
            FieldRole::Identity => &self.identity,
            FieldRole::Timestamp => &self.timestamp,
            FieldRole::Kind => &self.kind,
            FieldRole::Metric => return None,
        };
        aliases
            .iter()
            .filter_map(|alias| item.get(alias))
            .find(|value| is_present(value))
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
