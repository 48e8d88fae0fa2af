//! HTTP router configuration

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::api::{metrics, system};
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics::metrics))
        .route("/health", get(system::health))
        .with_state(state)
}
