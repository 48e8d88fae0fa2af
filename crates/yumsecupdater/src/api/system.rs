//! System endpoints

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Liveness probe body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub node: String,
    /// `None` until the first sample completes
    pub pending_updates: Option<usize>,
    pub last_sample: Option<DateTime<Utc>>,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.latest.borrow().clone();
    Json(HealthResponse {
        status: "ok".to_string(),
        node: state.metrics.node().to_string(),
        pending_updates: snapshot.as_ref().map(|s| s.pending_updates),
        last_sample: snapshot.map(|s| s.sampled_at),
    })
}
