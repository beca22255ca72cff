//! Error types for the external classifier adapter

use thiserror::Error;

/// Result type for classifier operations
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Errors that can occur while classifying an image
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Network-level failure talking to the model endpoint
    #[error("Classifier request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Model endpoint answered with a non-success status
    #[error("Classifier returned status {status}: {body}")]
    Upstream {
        /// HTTP status returned by the model endpoint
        status: reqwest::StatusCode,
        /// Raw response body, logged but never returned to callers
        body: String,
    },

    /// Model output was not the requested bare JSON object
    #[error("Failed to parse classifier output: {0}")]
    Parse(String),

    /// Model output parsed but violated the classification contract
    #[error("Classifier output violated contract: {0}")]
    Validation(String),
}
