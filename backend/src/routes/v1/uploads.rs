use std::sync::Arc;

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    middleware::VerifiedSubject,
    object_store::{derive_image_key, sanitize_extension, ImageStore, ScopedUrls},
    types::AppError,
};

/// TTL for upload credentials, 15 minutes
const UPLOAD_URL_TTL_SECS: u64 = 900;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSlotRequest {
    /// Requested file extension, with or without a leading dot
    pub file_extension: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSlotResponse {
    /// Presigned URL to upload the image with a PUT request
    pub upload_url: String,
    /// Storage key to submit on the subsequent recognition call
    pub image_key: String,
    /// Upload URL validity in seconds
    pub expires_in: u64,
}

/// Issues a scoped upload slot for the calling subject
///
/// Derives a key namespaced under `users/<subject>/` and returns a write
/// credential scoped to exactly that key. Nothing is persisted here; the key
/// only comes into existence when the client performs the upload, and no
/// existence check is made.
///
/// # Errors
///
/// - `401 UNAUTHORIZED` - No verified subject accompanies the request
/// - `500 INTERNAL_SERVER_ERROR` - Presigning mechanism failed
#[instrument(skip(image_store, payload))]
pub async fn request_upload_slot(
    subject: VerifiedSubject,
    Extension(image_store): Extension<Arc<ImageStore>>,
    payload: Option<Json<UploadSlotRequest>>,
) -> Result<Json<UploadSlotResponse>, AppError> {
    let requested = payload
        .as_ref()
        .and_then(|body| body.file_extension.as_deref());

    let extension = sanitize_extension(requested);
    let image_key = derive_image_key(&subject.subject_id, Some(&extension));
    let content_type = format!("image/{extension}");

    let upload_url = image_store
        .write_url(&image_key, &content_type, UPLOAD_URL_TTL_SECS)
        .await?;

    tracing::info!(image_key, "Issued upload slot");

    Ok(Json(UploadSlotResponse {
        upload_url,
        image_key,
        expires_in: UPLOAD_URL_TTL_SECS,
    }))
}
