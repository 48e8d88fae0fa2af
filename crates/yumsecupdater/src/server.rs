//! Metrics HTTP server

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::router::create_router;
use crate::state::AppState;

/// Serve until `cancel` fires, then finish in-flight scrapes
pub async fn serve(listener: TcpListener, state: Arc<AppState>, cancel: CancellationToken) {
    match listener.local_addr() {
        Ok(addr) => info!(addr = %addr, "start metrics server"),
        Err(e) => error!(error = %e, "metrics listener has no local address"),
    }

    let router = create_router(state);
    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
    {
        error!(error = %e, "metrics server failed");
    }
    info!("stop metrics server");
}
