//! The recognition pipeline
//!
//! One request runs the strictly sequential stages
//! `Validated → ReadCredentialed → Classified → Persisted → Returned`; any
//! stage can fail the run. The only retry anywhere is a single re-attempt of
//! the persistence stage after a sort-key collision.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use thiserror::Error;
use uuid::Uuid;

use recognition_storage::recognition::{RecognitionRecord, RecognitionStorageError};

use crate::classifier::{Classification, ClassifierError, IdentifySpecies};
use crate::object_store::{ObjectStoreError, ScopedUrls};

use super::{RecordStore, READ_URL_TTL_SECS};

/// Failure of a pipeline stage
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Subject identifier missing or empty
    #[error("subject identifier is missing")]
    Unauthorized,

    /// Request carried no image key
    #[error("imageKey is required")]
    MissingImageKey,

    /// Image key is not namespaced under the calling subject
    #[error("image key does not belong to the caller")]
    ForeignImageKey,

    /// Read credential issuance failed
    #[error(transparent)]
    Signing(#[from] ObjectStoreError),

    /// External classification failed
    #[error(transparent)]
    Classify(#[from] ClassifierError),

    /// Record write failed, including an exhausted collision retry
    #[error("Failed to persist recognition record: {0}")]
    Persistence(RecognitionStorageError),
}

/// Successful pipeline output
///
/// Carries the original storage key, never the read-credentialed URL minted
/// for the classifier; that URL is single-use inside the pipeline.
#[derive(Debug)]
pub struct RecognitionOutcome {
    /// The validated classification
    pub classification: Classification,
    /// The storage key the recognition was run against
    pub image_key: String,
}

/// Orchestrates one recognition request across the three collaborators
pub struct RecognitionPipeline {
    urls: Arc<dyn ScopedUrls>,
    classifier: Arc<dyn IdentifySpecies>,
    records: Arc<dyn RecordStore>,
}

impl RecognitionPipeline {
    /// Creates a pipeline over the injected collaborator handles
    #[must_use]
    pub fn new(
        urls: Arc<dyn ScopedUrls>,
        classifier: Arc<dyn IdentifySpecies>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            urls,
            classifier,
            records,
        }
    }

    /// Runs the pipeline for one `(subject, image key)` pair
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` naming the failed stage. Validation failures
    /// return before any collaborator is contacted.
    #[tracing::instrument(skip(self))]
    pub async fn run(
        &self,
        subject_id: &str,
        image_key: &str,
    ) -> Result<RecognitionOutcome, PipelineError> {
        // Stage: Validated
        if subject_id.is_empty() {
            return Err(PipelineError::Unauthorized);
        }
        if image_key.is_empty() {
            return Err(PipelineError::MissingImageKey);
        }
        if !image_key.starts_with(&format!("users/{subject_id}/")) {
            return Err(PipelineError::ForeignImageKey);
        }

        // Stage: ReadCredentialed
        let image_url = self.urls.read_url(image_key, READ_URL_TTL_SECS).await?;

        // Stage: Classified
        let classification = self.classifier.identify(&image_url).await?;
        tracing::info!(
            subject_id,
            image_key,
            confidence = classification.confidence,
            "Image classified"
        );

        // Stage: Persisted, with one retry on a timestamp collision
        let mut record = build_record(subject_id, image_key, &classification);
        if let Err(first) = self.records.put(&record).await {
            match first {
                RecognitionStorageError::RecordExists => {
                    tracing::warn!(
                        subject_id,
                        timestamp = record.timestamp,
                        "Recognition timestamp collided, retrying with a fresh timestamp"
                    );
                    record = build_record(subject_id, image_key, &classification);
                    self.records
                        .put(&record)
                        .await
                        .map_err(PipelineError::Persistence)?;
                }
                other => return Err(PipelineError::Persistence(other)),
            }
        }

        // Stage: Returned
        Ok(RecognitionOutcome {
            classification,
            image_key: image_key.to_string(),
        })
    }
}

/// Builds a record with a freshly captured timestamp and a unique id
fn build_record(
    subject_id: &str,
    image_key: &str,
    classification: &Classification,
) -> RecognitionRecord {
    let now = Utc::now();
    let timestamp = now.timestamp_millis();

    RecognitionRecord {
        subject_id: subject_id.to_string(),
        timestamp,
        recognition_id: format!("rec-{timestamp}-{}", Uuid::new_v4()),
        image_key: image_key.to_string(),
        kind: classification.kind,
        scientific_name: classification.scientific_name.clone(),
        common_name: classification.common_name.clone(),
        description: classification.description.clone(),
        confidence: classification.confidence,
        created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}
