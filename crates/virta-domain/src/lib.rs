//! virta-domain — normalization core for heterogeneous sensor telemetry.
//!
//! Converts raw JSON payloads (webhook bodies, document-store documents)
//! into a flat entity-attribute-value row stream. The core is a pure
//! transformation: no I/O, no cross-call state, every failure recovered
//! before the pipeline boundary.

pub mod alias;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod rows;
pub mod shape;
pub mod timestamp;
pub mod types;
pub mod unwrap;

pub use alias::{FieldAliasTable, FieldRole};
pub use config::NormalizerConfig;
pub use error::{NormalizeError, NormalizeResult};
pub use pipeline::{NormalizeOptions, Normalizer};
pub use rows::MetricRowBuilder;
pub use timestamp::{DefaultTimestamp, TimestampResolver, TimestampValue};
pub use types::{canonical_sensor_id, SensorRow};
pub use unwrap::Unwrapped;
