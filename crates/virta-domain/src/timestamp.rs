use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::{Map, Value};

use crate::alias::{FieldAliasTable, FieldRole};

/// Behavior when no tier of the fallback chain produces an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultTimestamp {
    /// Stamp the reading with the injected current time.
    CurrentTime,
    /// Report resolution failure and let the caller skip the reading.
    Skip,
}

/// A timestamp candidate handed in by a collaborator layer that has already
/// decoded its own time representation.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampValue {
    /// Native instant without an offset; taken as UTC.
    Instant(NaiveDateTime),
    /// Native instant with an explicit offset.
    Zoned(DateTime<FixedOffset>),
    /// ISO-8601 text; naive values are taken in the local reference zone.
    Text(String),
}

/// Resolves the authoritative instant for a reading via an ordered fallback
/// chain. Every produced instant is UTC, the reference zone.
///
/// Naive ISO-8601 text is interpreted in the configured local zone, while a
/// naive native instant is taken as UTC. The asymmetry reflects distinct
/// upstream sources and must be preserved.
#[derive(Debug, Clone)]
pub struct TimestampResolver {
    local_zone: Tz,
    aliases: FieldAliasTable,
}

impl TimestampResolver {
    pub fn new(local_zone: Tz, aliases: FieldAliasTable) -> Self {
        Self { local_zone, aliases }
    }

    /// Resolve the base instant for one reading, first match wins:
    ///
    /// 1. a `Timestamp`-role field on the reading, if parseable;
    /// 2. the collaborator-supplied value;
    /// 3. the structural hint derived from a wrapper key;
    /// 4. the default policy.
    ///
    /// Unparseable candidates fall through to the next tier; they are never
    /// an error.
    pub fn resolve(
        &self,
        reading: &Map<String, Value>,
        supplied: Option<&TimestampValue>,
        structural_hint: Option<DateTime<Utc>>,
        default: DefaultTimestamp,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if let Some(field) = self.aliases.first_present(reading, FieldRole::Timestamp) {
            if let Some(instant) = self.parse_field(field) {
                return Some(instant);
            }
        }
        if let Some(value) = supplied {
            if let Some(instant) = self.convert(value) {
                return Some(instant);
            }
        }
        if structural_hint.is_some() {
            return structural_hint;
        }
        match default {
            DefaultTimestamp::CurrentTime => Some(now),
            DefaultTimestamp::Skip => None,
        }
    }

    /// Convert a collaborator-supplied candidate.
    pub fn convert(&self, value: &TimestampValue) -> Option<DateTime<Utc>> {
        match value {
            TimestampValue::Instant(naive) => Some(Utc.from_utc_datetime(naive)),
            TimestampValue::Zoned(instant) => Some(instant.with_timezone(&Utc)),
            TimestampValue::Text(text) => self.parse_text(text),
        }
    }

    /// Parse ISO-8601 text. An explicit offset wins; a naive value is
    /// interpreted in the local reference zone before conversion to UTC.
    pub fn parse_text(&self, text: &str) -> Option<DateTime<Utc>> {
        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            return Some(instant.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return self.localize(naive);
            }
        }
        None
    }

    /// Only string fields are recognized in the payload tree.
    fn parse_field(&self, value: &Value) -> Option<DateTime<Utc>> {
        value.as_str().and_then(|text| self.parse_text(text))
    }

    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.local_zone
            .from_local_datetime(&naive)
            .earliest()
            .map(|instant| instant.with_timezone(&Utc))
    }
}
