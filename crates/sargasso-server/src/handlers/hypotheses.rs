//! Hypothesis, finding and correlation handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{AppError, AppState};
use sargasso_core::{Finding, HypothesisReport, MatrixView};

/// GET /api/hypotheses - Strongest finding plus its narrated hypothesis
///
/// Gateway problems are folded into the hypothesis text; only a failing
/// observation source turns into an error response.
pub async fn get_hypothesis(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HypothesisReport>, AppError> {
    let report = state.service.generate(state.source.as_ref()).await?;
    Ok(Json(report))
}

/// GET /api/findings - Strongest finding without narration (`null` if none)
pub async fn get_finding(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<Finding>>, AppError> {
    let finding = state.service.find(state.source.as_ref())?;
    Ok(Json(finding))
}

/// GET /api/correlations - Full matrix, NaN cells as `null`
pub async fn get_correlations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MatrixView>, AppError> {
    let view = state.service.correlations(state.source.as_ref())?;
    Ok(Json(view))
}
