//! Prometheus scrape endpoint

use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse};

use crate::api::error::AppError;
use crate::state::AppState;

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.encode()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
