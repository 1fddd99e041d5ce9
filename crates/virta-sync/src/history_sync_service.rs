use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::batch::RowBatcher;
use crate::error::{SyncError, SyncResult};
use crate::repository::{
    DocumentSource, FetchPageInput, RawDocument, SensorRowStore, StoreRowsInput,
};
use crate::sync_state::SyncStateHandle;
use virta_domain::{DefaultTimestamp, NormalizeOptions, Normalizer, SensorRow, TimestampValue};

/// Document ids in the legacy export scheme encode the reading time.
const DOC_ID_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySyncConfig {
    /// Documents fetched per page.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Row ceiling per bulk write.
    #[serde(default = "default_chunk_limit")]
    pub chunk_limit: usize,
}

fn default_page_limit() -> usize {
    100
}

fn default_chunk_limit() -> usize {
    10_000
}

impl Default for HistorySyncConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            chunk_limit: default_chunk_limit(),
        }
    }
}

/// Totals for one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub documents_seen: usize,
    pub documents_skipped: usize,
    pub rows_written: usize,
}

/// Domain service for the historical backfill path: streams documents out
/// of the store collection by collection, normalizes each one, and flushes
/// bounded, timestamp-sorted chunks to the row sink.
pub struct HistorySyncService {
    normalizer: Arc<Normalizer>,
    documents: Arc<dyn DocumentSource>,
    row_store: Arc<dyn SensorRowStore>,
    state: SyncStateHandle,
    config: HistorySyncConfig,
}

impl HistorySyncService {
    pub fn new(
        normalizer: Arc<Normalizer>,
        documents: Arc<dyn DocumentSource>,
        row_store: Arc<dyn SensorRowStore>,
        state: SyncStateHandle,
        config: HistorySyncConfig,
    ) -> Self {
        Self {
            normalizer,
            documents,
            row_store,
            state,
            config,
        }
    }

    /// Run a full backfill over the given collections. Only one run may be
    /// active at a time; a second call fails fast.
    pub async fn sync_collections(&self, collections: &[String]) -> SyncResult<SyncReport> {
        if !self.state.begin() {
            return Err(SyncError::SyncAlreadyRunning);
        }

        let mut total = SyncReport::default();
        for collection in collections {
            match self.sync_collection(collection).await {
                Ok(report) => {
                    total.documents_seen += report.documents_seen;
                    total.documents_skipped += report.documents_skipped;
                    total.rows_written += report.rows_written;
                }
                Err(error) => {
                    warn!(collection, %error, "history sync failed");
                    self.state.fail(error.to_string());
                    return Err(error);
                }
            }
        }

        self.state.succeed();
        info!(
            documents = total.documents_seen,
            skipped = total.documents_skipped,
            rows = total.rows_written,
            "history sync finished"
        );
        Ok(total)
    }

    /// Persisted timestamp bounds for a collection, the resumption cursors
    /// an incremental scheduler works from.
    pub async fn persisted_bounds(
        &self,
        collection: &str,
    ) -> SyncResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let oldest = self.row_store.oldest_timestamp(collection).await?;
        let newest = self.row_store.newest_timestamp(collection).await?;
        Ok((oldest, newest))
    }

    async fn sync_collection(&self, collection: &str) -> SyncResult<SyncReport> {
        info!(collection, "starting history sync");

        let mut report = SyncReport::default();
        let mut batcher = RowBatcher::new(self.config.chunk_limit);
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .documents
                .fetch_page(FetchPageInput {
                    collection: collection.to_string(),
                    after: cursor.clone(),
                    limit: self.config.page_limit,
                })
                .await?;

            for document in &page.documents {
                report.documents_seen += 1;

                let rows = self.normalize_document(collection, document);
                if rows.is_empty() {
                    report.documents_skipped += 1;
                    debug!(
                        collection,
                        document_id = %document.id,
                        "document produced no rows"
                    );
                    continue;
                }

                report.rows_written += rows.len();
                if let Some(chunk) = batcher.push(rows) {
                    self.flush(chunk).await?;
                }
            }

            cursor = page.next;
            if cursor.is_none() {
                break;
            }
        }

        if let Some(chunk) = batcher.finish() {
            self.flush(chunk).await?;
        }

        info!(
            collection,
            documents = report.documents_seen,
            skipped = report.documents_skipped,
            rows = report.rows_written,
            "collection synced"
        );
        Ok(report)
    }

    /// Normalize one document with the skip policy: a historical document
    /// that cannot be dated is skipped, never stamped with wall-clock time,
    /// so reruns stay replayable.
    fn normalize_document(&self, collection: &str, document: &RawDocument) -> Vec<SensorRow> {
        let supplied = document
            .recorded_at
            .map(TimestampValue::Instant)
            .or_else(|| parse_doc_id_timestamp(&document.id).map(TimestampValue::Instant));

        let mut options = NormalizeOptions::new(collection, Utc::now());
        options.supplied_timestamp = supplied;
        options.default_timestamp = DefaultTimestamp::Skip;

        self.normalizer.normalize_with(&document.payload, &options)
    }

    async fn flush(&self, chunk: Vec<SensorRow>) -> SyncResult<()> {
        debug!(rows = chunk.len(), "flushing row chunk");
        self.row_store.store_rows(StoreRowsInput { rows: chunk }).await
    }
}

/// Parse ids like `2024-01-15-12:30:00` from the legacy export scheme.
fn parse_doc_id_timestamp(id: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(id, DOC_ID_TIMESTAMP_FORMAT).ok()
}
