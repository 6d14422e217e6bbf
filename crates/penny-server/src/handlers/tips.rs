//! AI tip handlers

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::Method, Json};
use tracing::{info, warn};

use crate::{AppError, AppState};
use penny_core::models::{TipRequest, TipResult};

/// Client-facing message for any unparseable tip request
const INVALID_PAYLOAD: &str = "Invalid request payload";

/// POST /api/gemini-ai/getTip - Generate one financial tip
///
/// The body is parsed into a typed request before anything else happens, so
/// a malformed payload never reaches the AI backend.
pub async fn get_tip(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TipResult>, AppError> {
    let request = TipRequest::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Rejected tip request");
        AppError::bad_request(INVALID_PAYLOAD)
    })?;

    info!(
        goals = request.goals.len(),
        transactions = request.transactions.len(),
        "Tip requested"
    );

    let tip = state
        .tips
        .get_tip(&request)
        .await
        .map_err(|e| AppError::internal(&format!("Failed to get AI tip: {}", e)))?;

    Ok(Json(tip))
}

/// Any non-POST method on the tip route
pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::method_not_allowed(&method)
}
