use std::sync::Arc;

use serde_json::json;
use virta_domain::{Normalizer, NormalizerConfig};
use virta_sync::{
    DocumentPage, HistorySyncConfig, HistorySyncService, IngestPayloadInput, IngestionService,
    RawDocument, SyncError, SyncState, SyncStateHandle,
};

// In-memory implementations for integration testing
mod mocks {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use virta_domain::SensorRow;
    use virta_sync::{
        DocumentPage, DocumentSource, FetchPageInput, SensorRowStore, StoreRowsInput, SyncResult,
    };

    /// Records every flushed chunk; bounds are derived from stored rows.
    #[derive(Clone, Default)]
    pub struct InMemoryRowStore {
        chunks: Arc<Mutex<Vec<Vec<SensorRow>>>>,
    }

    impl InMemoryRowStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn chunks(&self) -> Vec<Vec<SensorRow>> {
            self.chunks.lock().unwrap().clone()
        }

        pub fn all_rows(&self) -> Vec<SensorRow> {
            self.chunks.lock().unwrap().iter().flatten().cloned().collect()
        }
    }

    #[async_trait]
    impl SensorRowStore for InMemoryRowStore {
        async fn store_rows(&self, input: StoreRowsInput) -> SyncResult<()> {
            self.chunks.lock().unwrap().push(input.rows);
            Ok(())
        }

        async fn oldest_timestamp(
            &self,
            sensor_kind: &str,
        ) -> SyncResult<Option<DateTime<Utc>>> {
            Ok(self
                .all_rows()
                .iter()
                .filter(|row| row.sensor_kind == sensor_kind)
                .map(|row| row.timestamp)
                .min())
        }

        async fn newest_timestamp(
            &self,
            sensor_kind: &str,
        ) -> SyncResult<Option<DateTime<Utc>>> {
            Ok(self
                .all_rows()
                .iter()
                .filter(|row| row.sensor_kind == sensor_kind)
                .map(|row| row.timestamp)
                .max())
        }
    }

    /// Serves pre-seeded pages keyed by collection name.
    #[derive(Default)]
    pub struct InMemoryDocumentSource {
        pages: HashMap<String, Vec<DocumentPage>>,
    }

    impl InMemoryDocumentSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed(&mut self, collection: &str, pages: Vec<DocumentPage>) {
            self.pages.insert(collection.to_string(), pages);
        }
    }

    #[async_trait]
    impl DocumentSource for InMemoryDocumentSource {
        async fn fetch_page(&self, input: FetchPageInput) -> SyncResult<DocumentPage> {
            let pages = self.pages.get(&input.collection).cloned().unwrap_or_default();
            let index = match &input.after {
                None => 0,
                Some(cursor) => cursor.parse::<usize>().unwrap_or(0) + 1,
            };
            Ok(pages.into_iter().nth(index).unwrap_or_default())
        }
    }
}

fn normalizer() -> Arc<Normalizer> {
    Arc::new(Normalizer::new(NormalizerConfig::default()))
}

fn document(id: &str, payload: serde_json::Value) -> RawDocument {
    RawDocument {
        id: id.to_string(),
        recorded_at: None,
        payload,
    }
}

#[tokio::test]
async fn webhook_flow_stores_rows_end_to_end() {
    // Arrange
    let store = mocks::InMemoryRowStore::new();
    let service = IngestionService::new(normalizer(), Arc::new(store.clone()));

    // Act
    let outcome = service
        .ingest(IngestPayloadInput {
            payload: json!({
                "sensor_id": "AA:BB:CC",
                "timestamp": "2024-01-15T12:00:00+00:00",
                "temperature": [20.0, 21.0, 22.0],
                "humidity": 65.0,
            }),
            sensor_kind: "viherpysakki".to_string(),
        })
        .await
        .unwrap();

    // Assert
    assert_eq!(outcome.rows_stored, 4);
    let rows = store.all_rows();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row.sensor_id == "AABBCC"));
    assert!(rows.iter().all(|row| row.sensor_kind == "viherpysakki"));
}

#[tokio::test]
async fn webhook_flow_rejects_unusable_payloads() {
    let store = mocks::InMemoryRowStore::new();
    let service = IngestionService::new(normalizer(), Arc::new(store.clone()));

    let result = service
        .ingest(IngestPayloadInput {
            payload: json!({"nothing": "useful"}),
            sensor_kind: "viherpysakki".to_string(),
        })
        .await;

    assert!(matches!(result, Err(SyncError::NoUsableData)));
    assert!(store.all_rows().is_empty());
}

#[tokio::test]
async fn backfill_flow_pages_chunks_and_reports() {
    // Arrange: two pages of dated documents plus one undateable document.
    let mut documents = mocks::InMemoryDocumentSource::new();
    documents.seed(
        "ymparistomoduuli",
        vec![
            DocumentPage {
                documents: vec![
                    document(
                        "2024-01-15-12:00:00",
                        json!({"sensor_1": {"temperature": [20.0, 21.0]}}),
                    ),
                    document("not-dated", json!({"sensor_2": {"temperature": [19.0]}})),
                ],
                next: Some("0".to_string()),
            },
            DocumentPage {
                documents: vec![document(
                    "2024-01-15-13:00:00",
                    json!({"sensor_3": {"humidity": [55.0, 56.0]}}),
                )],
                next: None,
            },
        ],
    );

    let store = mocks::InMemoryRowStore::new();
    let state = SyncStateHandle::new();
    let service = HistorySyncService::new(
        normalizer(),
        Arc::new(documents),
        Arc::new(store.clone()),
        state.clone(),
        HistorySyncConfig {
            page_limit: 10,
            chunk_limit: 2,
        },
    );

    // Act
    let report = service
        .sync_collections(&["ymparistomoduuli".to_string()])
        .await
        .unwrap();

    // Assert
    assert_eq!(report.documents_seen, 3);
    assert_eq!(report.documents_skipped, 1);
    assert_eq!(report.rows_written, 4);
    assert_eq!(state.snapshot(), SyncState::Succeeded);

    // Chunk ceiling of 2: each dated document fills one chunk.
    let chunks = store.chunks();
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|chunk| chunk.len() == 2));
    for chunk in &chunks {
        let timestamps: Vec<_> = chunk.iter().map(|row| row.timestamp).collect();
        let mut sorted = timestamps.clone();
        sorted.sort();
        assert_eq!(timestamps, sorted, "chunks are flushed in timestamp order");
    }

    // The undateable document is absent; the kind default is the
    // collection name.
    let rows = store.all_rows();
    assert!(rows.iter().all(|row| row.sensor_id != "sensor_2"));
    assert!(rows.iter().all(|row| row.sensor_kind == "ymparistomoduuli"));
}

#[tokio::test]
async fn backfill_exposes_resumption_cursors() {
    let mut documents = mocks::InMemoryDocumentSource::new();
    documents.seed(
        "env",
        vec![DocumentPage {
            documents: vec![document(
                "2024-01-15-12:00:00",
                json!({"sensor_1": {"temperature": [20.0, 21.0, 22.0]}}),
            )],
            next: None,
        }],
    );

    let store = mocks::InMemoryRowStore::new();
    let service = HistorySyncService::new(
        normalizer(),
        Arc::new(documents),
        Arc::new(store.clone()),
        SyncStateHandle::new(),
        HistorySyncConfig::default(),
    );

    service.sync_collections(&["env".to_string()]).await.unwrap();

    let (oldest, newest) = service.persisted_bounds("env").await.unwrap();
    // Three samples at the 5-minute cadence, base 12:00 UTC.
    assert_eq!(oldest, Some("2024-01-15T11:50:00Z".parse().unwrap()));
    assert_eq!(newest, Some("2024-01-15T12:00:00Z".parse().unwrap()));
}
