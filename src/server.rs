//! Router assembly and serving

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::{status_router, testing_router};
use crate::state::AppState;
use crate::webhook::webhook_router;

/// Build the full application router.
///
/// Test routes are mounted only when the configuration enables them.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .merge(webhook_router())
        .merge(status_router());

    if state.config.enable_test_endpoints {
        router = router.merge(testing_router());
    } else {
        info!("Test endpoints disabled");
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Serve `router` on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening for webhooks");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
