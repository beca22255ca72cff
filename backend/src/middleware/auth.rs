//! Verified-subject extraction
//!
//! Identity is issued and validated upstream; by the time a request reaches
//! this service, the fronting identity-aware proxy has already verified the
//! caller's token and injected the subject identifier as a header. This
//! middleware only lifts that header into request extensions; it never
//! validates tokens itself.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::types::AppError;

/// Header carrying the pre-verified subject identifier
pub const VERIFIED_SUBJECT_HEADER: &str = "x-verified-sub";

/// The verified subject on whose behalf a request runs
#[derive(Debug, Clone)]
pub struct VerifiedSubject {
    /// Opaque subject identifier supplied by the identity layer
    pub subject_id: String,
}

/// Axum extractor for the verified subject
///
/// Use this in handlers behind [`identity_middleware`]; it rejects with 401
/// when no subject was established for the request.
impl<S> FromRequestParts<S> for VerifiedSubject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            AppError::unauthorized("Subject identifier not found in request context")
        })
    }
}

/// Identity middleware
///
/// Reads the pre-verified subject header, inserts a [`VerifiedSubject`] into
/// request extensions, and returns 401 when the header is missing or empty.
///
/// # Errors
///
/// - `AppError` - 401 when no verified subject accompanies the request
pub async fn identity_middleware(mut request: Request, next: Next) -> Result<Response, AppError> {
    let subject_id = request
        .headers()
        .get(VERIFIED_SUBJECT_HEADER)
        .and_then(|header| header.to_str().ok())
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .map(str::to_string);

    let Some(subject_id) = subject_id else {
        return Err(AppError::unauthorized(
            "Subject identifier not found in request context",
        ));
    };

    request
        .extensions_mut()
        .insert(VerifiedSubject { subject_id });

    Ok(next.run(request).await)
}
