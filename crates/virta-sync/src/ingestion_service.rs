use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::repository::{SensorRowStore, StoreRowsInput};
use virta_domain::Normalizer;

/// Input delivered by the ingestion endpoint: one already-decoded JSON
/// payload plus the caller-known kind default (e.g. the channel name).
#[derive(Debug, Clone)]
pub struct IngestPayloadInput {
    pub payload: Value,
    pub sensor_kind: String,
}

/// Outcome of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub rows_stored: usize,
}

/// Domain service for the webhook path: normalize one payload and persist
/// the produced rows.
pub struct IngestionService {
    normalizer: Arc<Normalizer>,
    row_store: Arc<dyn SensorRowStore>,
}

impl IngestionService {
    pub fn new(normalizer: Arc<Normalizer>, row_store: Arc<dyn SensorRowStore>) -> Self {
        Self {
            normalizer,
            row_store,
        }
    }

    /// Normalize and store one webhook payload.
    ///
    /// Zero produced rows is reported as [`SyncError::NoUsableData`] so the
    /// transport can reject the request instead of silently accepting it.
    pub async fn ingest(&self, input: IngestPayloadInput) -> SyncResult<IngestOutcome> {
        debug!(sensor_kind = %input.sensor_kind, "normalizing webhook payload");

        let rows = self.normalizer.normalize(&input.payload, &input.sensor_kind);
        if rows.is_empty() {
            return Err(SyncError::NoUsableData);
        }

        let rows_stored = rows.len();
        self.row_store.store_rows(StoreRowsInput { rows }).await?;

        info!(
            sensor_kind = %input.sensor_kind,
            rows_stored,
            "stored webhook payload"
        );
        Ok(IngestOutcome { rows_stored })
    }
}
