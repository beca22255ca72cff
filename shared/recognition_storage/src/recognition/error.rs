//! Error types for recognition record storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{put_item::PutItemError, query::QueryError};
use thiserror::Error;

/// Result type alias for storage operations
pub type RecognitionStorageResult<T> = Result<T, RecognitionStorageError>;

/// Storage error types for recognition record operations
#[derive(Debug, Error)]
pub enum RecognitionStorageError {
    /// Failed to insert recognition record into `DynamoDB`
    #[error("Failed to insert recognition record into DynamoDB: {0:?}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to query recognition records from `DynamoDB`
    #[error("Failed to query recognition records from DynamoDB: {0:?}")]
    DynamoDbQueryError(#[from] SdkError<QueryError>),

    /// A record with the same (subject, timestamp) already exists
    #[error("Recognition record already exists for this subject and timestamp")]
    RecordExists,

    /// Failed to parse recognition record from `DynamoDB` item
    #[error("Failed to parse recognition record: {0}")]
    SerializationError(String),
}

impl From<serde_dynamo::Error> for RecognitionStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
