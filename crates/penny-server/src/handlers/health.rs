//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use penny_core::ai::AIBackend;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub model: String,
    pub host: String,
}

/// GET /api/health - Liveness plus the configured AI backend
///
/// Does not call the upstream service.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let client = state.tips.client();
    Json(HealthResponse {
        status: "ok",
        backend: client.backend_name(),
        model: client.model().to_string(),
        host: client.host().to_string(),
    })
}
