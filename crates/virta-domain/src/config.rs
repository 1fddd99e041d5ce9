use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::alias::FieldAliasTable;

/// Tunables for the normalization core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Decimal places kept on metric values.
    #[serde(default = "default_value_precision")]
    pub value_precision: u32,

    /// Minutes between synthesized timestamps when a metric arrives as a
    /// chronological array of readings (the producer's native sampling
    /// cadence for batched backlogs).
    #[serde(default = "default_list_interval_minutes")]
    pub list_interval_minutes: i64,

    /// Zone assumed for ISO-8601 timestamps that carry no offset.
    #[serde(default = "default_local_zone")]
    pub local_zone: Tz,

    /// Hard ceiling on nested-payload unwrapping.
    #[serde(default = "default_max_unwrap_depth")]
    pub max_unwrap_depth: usize,

    /// Key names recognized per semantic role.
    #[serde(default)]
    pub aliases: FieldAliasTable,
}

fn default_value_precision() -> u32 {
    4
}

fn default_list_interval_minutes() -> i64 {
    5
}

fn default_local_zone() -> Tz {
    chrono_tz::Europe::Helsinki
}

fn default_max_unwrap_depth() -> usize {
    8
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            value_precision: default_value_precision(),
            list_interval_minutes: default_list_interval_minutes(),
            local_zone: default_local_zone(),
            max_unwrap_depth: default_max_unwrap_depth(),
            aliases: FieldAliasTable::default(),
        }
    }
}

impl NormalizerConfig {
    /// Load from `VIRTA_`-prefixed environment variables on top of the
    /// built-in defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("VIRTA"))
            .build()?
            .try_deserialize()
    }

    pub fn list_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.list_interval_minutes)
    }
}
