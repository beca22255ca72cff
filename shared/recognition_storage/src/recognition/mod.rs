//! Recognition record storage module for `DynamoDB` operations
//!
//! Records are keyed by `subjectId` (partition) and `timestamp` in
//! milliseconds (sort). A record is immutable once written; the only
//! operations are a conditional insert and a newest-first query.

mod error;

use std::sync::Arc;

use aws_sdk_dynamodb::{error::SdkError, types::AttributeValue, Client as DynamoDbClient};
use serde::{Deserialize, Serialize};
use serde_dynamo::{from_items, to_item};
use strum::Display;

pub use error::{RecognitionStorageError, RecognitionStorageResult};

/// Whether the classified species is a plant or an animal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeciesKind {
    /// Plant species
    Plant,
    /// Animal species
    Animal,
}

/// A persisted recognition event for one subject
///
/// Stored flat in `DynamoDB`, camelCase attribute names on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionRecord {
    /// Owning subject (partition key)
    pub subject_id: String,
    /// Milliseconds since epoch at creation time (sort key)
    pub timestamp: i64,
    /// Globally unique reference id, not used for lookup
    pub recognition_id: String,
    /// Storage key of the classified image
    pub image_key: String,
    /// Plant or animal
    #[serde(rename = "type")]
    pub kind: SpeciesKind,
    /// Scientific (binomial) name
    pub scientific_name: String,
    /// Common name
    pub common_name: String,
    /// Short free-text description
    pub description: String,
    /// Model confidence in [0, 1], persisted unmodified
    pub confidence: f64,
    /// ISO-8601 creation time, informational only
    pub created_at: String,
}

/// `DynamoDB` attribute names for the recognition table
#[derive(Debug, Display)]
#[strum(serialize_all = "camelCase")]
pub enum RecognitionAttribute {
    /// Partition key
    SubjectId,
    /// Sort key, milliseconds since epoch
    Timestamp,
}

/// Storage client for recognition record operations
pub struct RecognitionStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl RecognitionStorage {
    /// Creates a new storage instance
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for recognition records
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }

    /// Inserts a new recognition record
    ///
    /// The write is conditional on no record existing for the same
    /// `(subjectId, timestamp)` key, so a sort-key collision surfaces as
    /// [`RecognitionStorageError::RecordExists`] instead of a silent
    /// overwrite. The caller decides whether to retry with a fresh timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RecognitionStorageError` if the `DynamoDB` operation fails
    pub async fn insert(&self, record: &RecognitionRecord) -> RecognitionStorageResult<()> {
        let item = to_item(record)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", RecognitionAttribute::SubjectId.to_string())
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    RecognitionStorageError::RecordExists
                } else {
                    err.into()
                }
            })?;

        Ok(())
    }

    /// Returns up to `limit` records for a subject, newest first
    ///
    /// An empty history is a valid result, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RecognitionStorageError` if the `DynamoDB` query operation fails
    pub async fn query_recent(
        &self,
        subject_id: &str,
        limit: i32,
    ) -> RecognitionStorageResult<Vec<RecognitionRecord>> {
        let response = self
            .dynamodb_client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#subject = :subject")
            .expression_attribute_names("#subject", RecognitionAttribute::SubjectId.to_string())
            .expression_attribute_values(":subject", AttributeValue::S(subject_id.to_string()))
            .scan_index_forward(false)
            .limit(limit)
            .send()
            .await?;

        let items = response.items.unwrap_or_default();
        let records = from_items::<_, RecognitionRecord>(items)?;

        Ok(records)
    }
}
