//! virta-sync — ingestion and backfill orchestration over the virta
//! normalization core.
//!
//! The transports and stores themselves live elsewhere; this crate defines
//! the contracts the core needs from them ([`SensorRowStore`],
//! [`DocumentSource`]) and the domain services that drive one payload
//! (webhook) or many documents (historical backfill) through normalization
//! and into the sink.

pub mod batch;
pub mod error;
pub mod history_sync_service;
pub mod ingestion_service;
pub mod repository;
pub mod sync_state;

pub use batch::RowBatcher;
pub use error::{SyncError, SyncResult};
pub use history_sync_service::{HistorySyncConfig, HistorySyncService, SyncReport};
pub use ingestion_service::{IngestOutcome, IngestPayloadInput, IngestionService};
pub use repository::{
    DocumentPage, DocumentSource, FetchPageInput, RawDocument, SensorRowStore, StoreRowsInput,
};
pub use sync_state::{SyncState, SyncStateHandle};
