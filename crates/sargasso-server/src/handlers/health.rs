//! Health and fallback handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{AppError, AppState};
use sargasso_core::AIBackend;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// `null` when no gateway is configured
    pub gateway: Option<GatewayStatus>,
}

#[derive(Debug, Serialize)]
pub struct GatewayStatus {
    pub backend: String,
    pub host: String,
    pub model: String,
    pub healthy: bool,
}

/// GET /api/health - Server liveness and narration gateway reachability
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let gateway = match state.service.composer().gateway() {
        Some(client) => Some(GatewayStatus {
            backend: client.backend_name().to_string(),
            host: client.host().to_string(),
            model: client.model().to_string(),
            healthy: client.health_check().await,
        }),
        None => None,
    };

    Json(HealthResponse {
        status: "ok",
        gateway,
    })
}

/// Unknown /api routes
pub async fn api_not_found() -> AppError {
    AppError::not_found("Not found")
}
