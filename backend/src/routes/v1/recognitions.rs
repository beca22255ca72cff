use std::sync::Arc;

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use recognition_storage::recognition::SpeciesKind;

use crate::{
    middleware::VerifiedSubject, recognition::RecognitionPipeline, types::AppError,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionRequest {
    /// Storage key returned by the upload slot call
    #[serde(default)]
    pub image_key: String,
}

#[derive(Debug, Serialize)]
pub struct RecognitionResponse {
    pub success: bool,
    pub recognition: RecognitionBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionBody {
    #[serde(rename = "type")]
    pub kind: SpeciesKind,
    pub scientific_name: String,
    pub common_name: String,
    pub description: String,
    pub confidence: f64,
    /// The submitted storage key, echoed back
    pub image_key: String,
}

/// Runs the recognition pipeline for a previously uploaded image
///
/// # Errors
///
/// - `401 UNAUTHORIZED` - No verified subject accompanies the request
/// - `400 BAD_REQUEST` - Missing `imageKey`
/// - `403 FORBIDDEN` - `imageKey` outside the caller's namespace
/// - `502 BAD_GATEWAY` - Classifier output malformed or out of contract
/// - `503 SERVICE_UNAVAILABLE` - Classifier unreachable
/// - `500 INTERNAL_SERVER_ERROR` - Credential issuance or persistence failed
#[instrument(skip(pipeline, payload))]
pub async fn submit_recognition(
    subject: VerifiedSubject,
    Extension(pipeline): Extension<Arc<RecognitionPipeline>>,
    Json(payload): Json<RecognitionRequest>,
) -> Result<Json<RecognitionResponse>, AppError> {
    let outcome = pipeline
        .run(&subject.subject_id, &payload.image_key)
        .await?;

    Ok(Json(RecognitionResponse {
        success: true,
        recognition: RecognitionBody {
            kind: outcome.classification.kind,
            scientific_name: outcome.classification.scientific_name,
            common_name: outcome.classification.common_name,
            description: outcome.classification.description,
            confidence: outcome.classification.confidence,
            image_key: outcome.image_key,
        },
    }))
}
