use std::sync::Arc;

use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

use crate::{
    middleware::VerifiedSubject,
    recognition::{HistoryEntry, HistoryService, DEFAULT_HISTORY_LIMIT},
    types::AppError,
};

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    /// Number of records in `history`
    pub count: usize,
    /// Records newest first, each with a fresh one-hour image URL
    pub history: Vec<HistoryEntry>,
}

/// Lists the caller's recent recognitions
///
/// # Errors
///
/// - `401 UNAUTHORIZED` - No verified subject accompanies the request
/// - `500 INTERNAL_SERVER_ERROR` - Query failed, or credential issuance
///   failed for any record (no partial pages)
#[instrument(skip(history))]
pub async fn list_history(
    subject: VerifiedSubject,
    Extension(history): Extension<Arc<HistoryService>>,
) -> Result<Json<HistoryResponse>, AppError> {
    let entries = history
        .list(&subject.subject_id, DEFAULT_HISTORY_LIMIT)
        .await?;

    Ok(Json(HistoryResponse {
        success: true,
        count: entries.len(),
        history: entries,
    }))
}
