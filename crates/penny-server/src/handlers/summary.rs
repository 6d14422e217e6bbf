//! Dashboard summary handler

use axum::{body::Bytes, Json};

use crate::AppError;
use penny_core::aggregate::summarize;
use penny_core::models::{DashboardSummary, SummaryRequest};

/// POST /api/summary - Totals, category groups, breakdown, and goal progress
pub async fn summary(body: Bytes) -> Result<Json<DashboardSummary>, AppError> {
    let request = SummaryRequest::from_slice(&body)
        .map_err(|_| AppError::bad_request("Invalid request payload"))?;

    Ok(Json(summarize(&request.transactions, &request.goals)))
}
