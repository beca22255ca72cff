//! History listing with per-item credential enrichment
//!
//! Records come back from the store newest first; each one gets a fresh
//! read URL minted concurrently. The join is all-or-nothing: a single
//! issuance failure fails the whole request rather than returning a partial
//! page.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use thiserror::Error;

use recognition_storage::recognition::{
    RecognitionRecord, RecognitionStorageError, SpeciesKind,
};

use crate::object_store::{ObjectStoreError, ScopedUrls};

use super::{RecordStore, READ_URL_TTL_SECS};

/// How many records a history page returns at most
pub const DEFAULT_HISTORY_LIMIT: i32 = 10;

/// Failure while listing history
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Subject identifier missing or empty
    #[error("subject identifier is missing")]
    Unauthorized,

    /// Record store query failed
    #[error(transparent)]
    Query(#[from] RecognitionStorageError),

    /// Read credential issuance failed for at least one record
    #[error("Failed to issue read credential for a history item: {0}")]
    Enrichment(ObjectStoreError),
}

/// One history record enriched with a fresh read URL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique reference id of the recognition
    pub recognition_id: String,
    /// Sort-key timestamp, milliseconds since epoch
    pub timestamp: i64,
    /// ISO-8601 creation time
    pub created_at: String,
    /// Plant or animal
    #[serde(rename = "type")]
    pub kind: SpeciesKind,
    /// Scientific (binomial) name
    pub scientific_name: String,
    /// Common name
    pub common_name: String,
    /// Short free-text description
    pub description: String,
    /// Model confidence in [0, 1]
    pub confidence: f64,
    /// Freshly minted read URL, valid for one hour
    pub image_url: String,
    /// Storage key of the original image
    pub image_key: String,
}

impl HistoryEntry {
    fn from_record(record: &RecognitionRecord, image_url: String) -> Self {
        Self {
            recognition_id: record.recognition_id.clone(),
            timestamp: record.timestamp,
            created_at: record.created_at.clone(),
            kind: record.kind,
            scientific_name: record.scientific_name.clone(),
            common_name: record.common_name.clone(),
            description: record.description.clone(),
            confidence: record.confidence,
            image_url,
            image_key: record.image_key.clone(),
        }
    }
}

/// Returns a subject's recent recognitions with temporary image access
pub struct HistoryService {
    records: Arc<dyn RecordStore>,
    urls: Arc<dyn ScopedUrls>,
}

impl HistoryService {
    /// Creates a history service over the injected collaborator handles
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>, urls: Arc<dyn ScopedUrls>) -> Self {
        Self { records, urls }
    }

    /// Lists up to `limit` records for a subject, newest first
    ///
    /// Credential issuance runs concurrently across items; the response keeps
    /// the store's descending-timestamp order.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the query or any single credential issuance
    /// fails; no partial results are returned.
    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        subject_id: &str,
        limit: i32,
    ) -> Result<Vec<HistoryEntry>, HistoryError> {
        if subject_id.is_empty() {
            return Err(HistoryError::Unauthorized);
        }

        let records = self.records.recent(subject_id, limit).await?;
        tracing::debug!(subject_id, count = records.len(), "Fetched recognition history");

        let entries = try_join_all(records.iter().map(|record| async {
            let image_url = self
                .urls
                .read_url(&record.image_key, READ_URL_TTL_SECS)
                .await
                .map_err(HistoryError::Enrichment)?;

            Ok::<_, HistoryError>(HistoryEntry::from_record(record, image_url))
        }))
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use recognition_storage::recognition::RecognitionStorageResult;

    use crate::object_store::ObjectStoreResult;

    use super::*;

    fn record(timestamp: i64) -> RecognitionRecord {
        RecognitionRecord {
            subject_id: "u1".to_string(),
            timestamp,
            recognition_id: format!("rec-{timestamp}-x"),
            image_key: format!("users/u1/image-{timestamp}.jpg"),
            kind: SpeciesKind::Animal,
            scientific_name: "Vulpes vulpes".to_string(),
            common_name: "Red fox".to_string(),
            description: "A small omnivorous canid.".to_string(),
            confidence: 0.92,
            created_at: "2024-04-01T18:13:20.123Z".to_string(),
        }
    }

    struct FakeRecords {
        records: Vec<RecognitionRecord>,
        seen_limit: AtomicUsize,
    }

    impl FakeRecords {
        fn with(records: Vec<RecognitionRecord>) -> Arc<Self> {
            Arc::new(Self {
                records,
                seen_limit: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RecordStore for FakeRecords {
        async fn put(&self, _record: &RecognitionRecord) -> RecognitionStorageResult<()> {
            Ok(())
        }

        async fn recent(
            &self,
            _subject_id: &str,
            limit: i32,
        ) -> RecognitionStorageResult<Vec<RecognitionRecord>> {
            self.seen_limit
                .store(usize::try_from(limit).unwrap(), Ordering::SeqCst);
            Ok(self
                .records
                .iter()
                .take(usize::try_from(limit).unwrap())
                .cloned()
                .collect())
        }
    }

    struct FakeUrls {
        calls: AtomicUsize,
        fail_for_key: Option<String>,
    }

    impl FakeUrls {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_for_key: None,
            })
        }

        fn failing_for(key: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_for_key: Some(key.to_string()),
            })
        }
    }

    #[async_trait]
    impl ScopedUrls for FakeUrls {
        async fn read_url(&self, key: &str, ttl_secs: u64) -> ObjectStoreResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);

            if self.fail_for_key.as_deref() == Some(key) {
                return Err(ObjectStoreError::Presign("signing backend down".to_string()));
            }

            Ok(format!("https://signed.test/{key}?ttl={ttl_secs}&n={n}"))
        }

        async fn write_url(
            &self,
            key: &str,
            _content_type: &str,
            ttl_secs: u64,
        ) -> ObjectStoreResult<String> {
            Ok(format!("https://signed.test/put/{key}?ttl={ttl_secs}"))
        }
    }

    #[tokio::test]
    async fn test_empty_history_is_ok() {
        let service = HistoryService::new(FakeRecords::with(vec![]), FakeUrls::new());

        let entries = service.list("u1", DEFAULT_HISTORY_LIMIT).await.unwrap();

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_descending_order_is_preserved() {
        let records = FakeRecords::with(vec![record(30), record(20), record(10)]);
        let service = HistoryService::new(records, FakeUrls::new());

        let entries = service.list("u1", DEFAULT_HISTORY_LIMIT).await.unwrap();

        let timestamps: Vec<i64> = entries.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![30, 20, 10]);
        assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_each_entry_gets_a_fresh_distinct_url() {
        let records = FakeRecords::with(vec![record(30), record(20)]);
        let urls = FakeUrls::new();
        let service = HistoryService::new(records, urls.clone());

        let entries = service.list("u1", DEFAULT_HISTORY_LIMIT).await.unwrap();

        assert_eq!(urls.calls.load(Ordering::SeqCst), 2);
        assert_ne!(entries[0].image_url, entries[1].image_url);
        assert!(entries[0].image_url.contains(&entries[0].image_key));
    }

    #[tokio::test]
    async fn test_limit_is_forwarded_and_respected() {
        let records = FakeRecords::with((0..20i64).rev().map(record).collect());
        let service = HistoryService::new(records.clone(), FakeUrls::new());

        let entries = service.list("u1", DEFAULT_HISTORY_LIMIT).await.unwrap();

        assert_eq!(records.seen_limit.load(Ordering::SeqCst), 10);
        assert_eq!(entries.len(), 10);
    }

    #[tokio::test]
    async fn test_single_enrichment_failure_fails_the_whole_request() {
        let records = FakeRecords::with(vec![record(30), record(20), record(10)]);
        let urls = FakeUrls::failing_for("users/u1/image-20.jpg");
        let service = HistoryService::new(records, urls);

        let err = service.list("u1", DEFAULT_HISTORY_LIMIT).await.unwrap_err();

        assert!(matches!(err, HistoryError::Enrichment(_)));
    }

    #[tokio::test]
    async fn test_empty_subject_is_unauthorized_without_store_call() {
        let records = FakeRecords::with(vec![record(30)]);
        let service = HistoryService::new(records.clone(), FakeUrls::new());

        let err = service.list("", DEFAULT_HISTORY_LIMIT).await.unwrap_err();

        assert!(matches!(err, HistoryError::Unauthorized));
        assert_eq!(records.seen_limit.load(Ordering::SeqCst), 0);
    }
}
