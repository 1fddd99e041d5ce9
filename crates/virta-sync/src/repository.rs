use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::SyncResult;
use virta_domain::SensorRow;

/// Input for storing a batch of normalized rows.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRowsInput {
    pub rows: Vec<SensorRow>,
}

/// One raw document pulled from the document store. The id is opaque to
/// the normalization core, but some producers encode the reading time in
/// it, and it is used for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: String,
    /// Reading time as decoded natively by the store client, when the
    /// store tracks one.
    pub recorded_at: Option<NaiveDateTime>,
    pub payload: Value,
}

/// Input for fetching one page of documents from a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPageInput {
    pub collection: String,
    /// Resume after this document id; `None` starts from the beginning.
    pub after: Option<String>,
    pub limit: usize,
}

/// One page of documents plus the cursor to resume from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentPage {
    pub documents: Vec<RawDocument>,
    /// Cursor for the next page; `None` when the collection is exhausted.
    pub next: Option<String>,
}

/// Sink for normalized rows. Infrastructure implements an idempotent upsert
/// keyed by `(timestamp, sensor_id, metric_name)`; conflict resolution
/// against previously stored data is the sink's responsibility.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SensorRowStore: Send + Sync {
    /// Upsert a batch of rows.
    async fn store_rows(&self, input: StoreRowsInput) -> SyncResult<()>;

    /// Oldest persisted timestamp for a sensor kind; backfill cursor.
    async fn oldest_timestamp(&self, sensor_kind: &str) -> SyncResult<Option<DateTime<Utc>>>;

    /// Newest persisted timestamp for a sensor kind; incremental cursor.
    async fn newest_timestamp(&self, sensor_kind: &str) -> SyncResult<Option<DateTime<Utc>>>;
}

/// Paginated read access to the document store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch one page of a collection, resuming after the given cursor.
    async fn fetch_page(&self, input: FetchPageInput) -> SyncResult<DocumentPage>;
}
