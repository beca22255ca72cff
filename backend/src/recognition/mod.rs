//! Recognition pipeline and history service
//!
//! Both services work through constructor-injected collaborator handles: the
//! scoped URL issuer, the external classifier, and the record store. The seam
//! traits let tests substitute fakes for all three.

pub mod history;
pub mod pipeline;

use async_trait::async_trait;

use recognition_storage::recognition::{
    RecognitionRecord, RecognitionStorage, RecognitionStorageResult,
};

pub use history::{HistoryEntry, HistoryError, HistoryService, DEFAULT_HISTORY_LIMIT};
pub use pipeline::{PipelineError, RecognitionOutcome, RecognitionPipeline};

/// TTL for read credentials handed to the classifier and to history display
pub const READ_URL_TTL_SECS: u64 = 3600;

/// Persists and queries recognition records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes one immutable record; collisions surface as `RecordExists`
    async fn put(&self, record: &RecognitionRecord) -> RecognitionStorageResult<()>;

    /// Returns up to `limit` records for a subject, newest first
    async fn recent(
        &self,
        subject_id: &str,
        limit: i32,
    ) -> RecognitionStorageResult<Vec<RecognitionRecord>>;
}

#[async_trait]
impl RecordStore for RecognitionStorage {
    async fn put(&self, record: &RecognitionRecord) -> RecognitionStorageResult<()> {
        self.insert(record).await
    }

    async fn recent(
        &self,
        subject_id: &str,
        limit: i32,
    ) -> RecognitionStorageResult<Vec<RecognitionRecord>> {
        self.query_recent(subject_id, limit).await
    }
}
