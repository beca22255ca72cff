pub mod health;
pub mod v1;

use axum::{routing::get, Router};

/// Creates the router with all handler routes
pub fn handler() -> Router {
    Router::new()
        .route("/health", get(health::handler))
        .nest("/v1", v1::handler())
}
