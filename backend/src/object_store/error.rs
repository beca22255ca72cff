//! Error types for object storage operations

use thiserror::Error;

/// Result type for object storage operations
pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Errors that can occur during object storage operations
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// Invalid storage key provided
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Presigning mechanism unreachable or misconfigured
    #[error("Failed to presign URL: {0}")]
    Presign(String),
}
