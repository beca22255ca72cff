//! Universal error handling for the API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::classifier::ClassifierError;
use crate::object_store::ObjectStoreError;
use crate::recognition::{HistoryError, PipelineError};
use recognition_storage::recognition::RecognitionStorageError;

/// API error body returned to callers
///
/// `error` names the status class, `message` is a sanitized description. Raw
/// collaborator error text never ends up here; it goes to the log.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Status class name
    error: &'static str,
    /// Human-readable, sanitized message
    message: String,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    body: ErrorBody,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error,
                message: message.into(),
            },
        }
    }

    /// 401 with the `Unauthorized` status class
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", message)
    }

    /// 400 with the `Bad Request` status class
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", message)
    }

    /// 403 with the `Forbidden` status class
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden", message)
    }

    /// 502 with the `Bad Gateway` status class
    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "Bad Gateway", message)
    }

    /// 503 with the `Service Unavailable` status class
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable",
            message,
        )
    }

    /// 500 with the `Internal Server Error` status class
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            message,
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", self.body.error, self.body.message),
            500..=599 => tracing::error!("Server error: {} - {}", self.body.error, self.body.message),
            _ => {}
        }

        (self.status, Json(self.body)).into_response()
    }
}

/// Convert object store errors to application errors
impl From<ObjectStoreError> for AppError {
    fn from(err: ObjectStoreError) -> Self {
        match &err {
            ObjectStoreError::InvalidKey(msg) => {
                tracing::warn!("Invalid storage key: {msg}");
                Self::bad_request("Invalid storage key")
            }
            ObjectStoreError::Presign(msg) => {
                tracing::error!("Presigning failure: {msg}");
                Self::internal("Failed to issue storage credential")
            }
        }
    }
}

/// Convert classifier errors to application errors
impl From<ClassifierError> for AppError {
    fn from(err: ClassifierError) -> Self {
        match &err {
            ClassifierError::Request(e) => {
                tracing::error!("Classifier request error: {e}");
                Self::service_unavailable("Species classifier is unreachable")
            }
            ClassifierError::Upstream { status, body } => {
                tracing::error!("Classifier upstream error ({status}): {body}");
                Self::service_unavailable("Species classifier is temporarily unavailable")
            }
            ClassifierError::Parse(msg) => {
                tracing::error!("Classifier parse failure: {msg}");
                Self::bad_gateway("Species classifier returned malformed output")
            }
            ClassifierError::Validation(msg) => {
                tracing::error!("Classifier validation failure: {msg}");
                Self::bad_gateway("Species classifier output failed validation")
            }
        }
    }
}

/// Convert storage errors to application errors
impl From<RecognitionStorageError> for AppError {
    fn from(err: RecognitionStorageError) -> Self {
        tracing::error!("Recognition storage error: {err}");
        Self::internal("Failed to access recognition records")
    }
}

/// Convert pipeline errors to application errors
impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Unauthorized => {
                Self::unauthorized("Subject identifier not found in request context")
            }
            PipelineError::MissingImageKey => Self::bad_request("imageKey is required"),
            PipelineError::ForeignImageKey => {
                Self::forbidden("imageKey does not belong to the authenticated subject")
            }
            PipelineError::Signing(e) => e.into(),
            PipelineError::Classify(e) => e.into(),
            PipelineError::Persistence(e) => {
                tracing::error!("Recognition persistence failure: {e}");
                Self::internal("Failed to persist recognition record")
            }
        }
    }
}

/// Convert history errors to application errors
impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::Unauthorized => {
                Self::unauthorized("Subject identifier not found in request context")
            }
            HistoryError::Query(e) => e.into(),
            HistoryError::Enrichment(e) => {
                tracing::error!("History enrichment failure: {e}");
                Self::internal("Failed to issue image access for history")
            }
        }
    }
}
