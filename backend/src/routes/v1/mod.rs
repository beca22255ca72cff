pub mod history;
pub mod recognitions;
pub mod uploads;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::middleware::auth::identity_middleware;

/// Creates the v1 API router with all v1 handler routes
///
/// Every v1 operation requires a verified subject.
pub fn handler() -> Router {
    Router::new()
        .route("/uploads", post(uploads::request_upload_slot))
        .route("/recognitions", post(recognitions::submit_recognition))
        .route("/history", get(history::list_history))
        .layer(middleware::from_fn(identity_middleware))
}
