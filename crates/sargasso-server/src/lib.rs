//! Sargasso Web Server
//!
//! Axum-based REST API exposing the hypothesis pipeline to dashboards:
//! - `GET /api/health` - liveness plus narration gateway status
//! - `GET /api/hypotheses` - finding plus generated hypothesis
//! - `GET /api/findings` - strongest finding without narration
//! - `GET /api/correlations` - full correlation matrix for charts
//! - `GET /api/species` - species label table
//! - `GET /api/sightings` - the raw sighting batch
//!
//! Every request loads a fresh batch from the observation source; the
//! server keeps no mutable state between requests.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use sargasso_core::{
    AIBackend, Config, HypothesisComposer, HypothesisService, ObservationSource, PromptLibrary,
    ServerConfig,
};

mod handlers;

/// Shared application state
pub struct AppState {
    pub service: HypothesisService,
    pub source: Arc<dyn ObservationSource>,
}

/// Build the router around a ready service and source
pub fn create_router(
    service: HypothesisService,
    source: Arc<dyn ObservationSource>,
    config: &ServerConfig,
) -> Router {
    let state = Arc::new(AppState { service, source });

    let api_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/hypotheses", get(handlers::get_hypothesis))
        .route("/findings", get(handlers::get_finding))
        .route("/correlations", get(handlers::get_correlations))
        .route("/species", get(handlers::get_species))
        .route("/sightings", get(handlers::get_sightings))
        .fallback(handlers::api_not_found);

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.allowed_origins))
}

/// Read-only CORS policy; no origins means same-origin only
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        cors
    } else {
        cors.allow_origin(origins)
    }
}

/// Start the server
pub async fn serve(
    host: &str,
    port: u16,
    config: &Config,
    source: Arc<dyn ObservationSource>,
) -> anyhow::Result<()> {
    let composer = HypothesisComposer::from_config(config, &PromptLibrary::new())?;
    check_ai_connection(&composer).await;

    let app = create_router(HypothesisService::new(composer), source, &config.server);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log narration gateway status
async fn check_ai_connection(composer: &HypothesisComposer) {
    match composer.gateway() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    backend = client.backend_name(),
                    host = client.host(),
                    model = client.model(),
                    "Narration gateway connected"
                );
            } else {
                warn!(
                    backend = client.backend_name(),
                    host = client.host(),
                    "Narration gateway configured but not responding"
                );
            }
        }
        None => {
            info!("Narration gateway not configured (set GEMINI_API_KEY or AI_BACKEND)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err.into()),
        }
    }
}
