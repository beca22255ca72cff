use std::sync::Arc;
use std::time::Duration;

use axum::Extension;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

use crate::object_store::ImageStore;
use crate::recognition::{HistoryService, RecognitionPipeline};
use crate::routes;

/// Upper bound on one request, sized for the classifier round-trip
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Starts the server with the given dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    image_store: Arc<ImageStore>,
    pipeline: Arc<RecognitionPipeline>,
    history: Arc<HistoryService>,
) -> anyhow::Result<()> {
    let router = routes::handler()
        .layer(Extension(image_store))
        .layer(Extension(pipeline))
        .layer(Extension(history))
        // Browser clients upload directly to storage, so every response
        // carries a permissive cross-origin allowance
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(
            REQUEST_TIMEOUT_SECS,
        )));

    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8001), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🌿 Species recognition backend started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
