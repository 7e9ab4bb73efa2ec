//! Test utilities for sargasso-core
//!
//! Provides a mock LLM server speaking the Gemini, Ollama and
//! OpenAI-compatible wire formats, for integration tests and local
//! development without network access.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Re-exported so callers can script error statuses without depending on axum
pub use axum::http::StatusCode;

/// How the mock server answers generation requests
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Reply text; `None` answers 200 with no text segments
    pub reply: Option<String>,
    /// HTTP status for generation requests
    pub status: StatusCode,
    /// Artificial latency before answering
    pub delay: Option<Duration>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            reply: Some(
                "Sightings of this species appear tied to the observed conditions, \
                 which warrants further investigation."
                    .to_string(),
            ),
            status: StatusCode::OK,
            delay: None,
        }
    }
}

impl MockBehavior {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self {
            reply: None,
            ..Self::default()
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct MockState {
    behavior: Mutex<MockBehavior>,
    requests: AtomicUsize,
    last_request: Mutex<Option<Value>>,
    last_api_key: Mutex<Option<String>>,
}

/// Mock LLM server for testing and development
pub struct MockLlmServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockLlmServer {
    /// Start the mock server on an available port with the default reply
    pub async fn start() -> Self {
        Self::with_behavior(MockBehavior::default()).await
    }

    /// Start the mock server with scripted behavior
    pub async fn with_behavior(behavior: MockBehavior) -> Self {
        let state = Arc::new(MockState {
            behavior: Mutex::new(behavior),
            ..MockState::default()
        });

        let app = Router::new()
            // Gemini: GET is the health probe, POST carries ":generateContent"
            .route(
                "/v1beta/models/:model",
                get(handle_gemini_model).post(handle_gemini_generate),
            )
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_ollama_generate))
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat_completions))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock LLM server");
        let addr = listener.local_addr().expect("mock LLM server address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace the scripted behavior for subsequent requests
    pub fn set_behavior(&self, behavior: MockBehavior) {
        if let Ok(mut current) = self.state.behavior.lock() {
            *current = behavior;
        }
    }

    /// Number of generation requests received
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// JSON body of the most recent generation request
    pub fn last_request(&self) -> Option<Value> {
        self.state.last_request.lock().ok().and_then(|r| r.clone())
    }

    /// `key` query parameter of the most recent Gemini request
    pub fn last_api_key(&self) -> Option<String> {
        self.state.last_api_key.lock().ok().and_then(|k| k.clone())
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockLlmServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Record the request, apply delay, and return the reply (or a status error)
async fn script(state: &MockState, body: Value) -> Result<Option<String>, Response> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut last) = state.last_request.lock() {
        *last = Some(body);
    }

    let behavior = state
        .behavior
        .lock()
        .map(|b| b.clone())
        .unwrap_or_default();

    if let Some(delay) = behavior.delay {
        tokio::time::sleep(delay).await;
    }

    if !behavior.status.is_success() {
        return Err((behavior.status, "mock upstream failure").into_response());
    }
    Ok(behavior.reply)
}

async fn handle_gemini_model(Path(model): Path<String>) -> Json<Value> {
    Json(json!({ "name": format!("models/{}", model) }))
}

async fn handle_gemini_generate(
    State(state): State<Arc<MockState>>,
    Path(model): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if !model.ends_with(":generateContent") {
        return (StatusCode::NOT_FOUND, "unknown model action").into_response();
    }
    if let Ok(mut key) = state.last_api_key.lock() {
        *key = params.get("key").cloned();
    }

    match script(&state, body).await {
        Ok(Some(text)) => Json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        Ok(None) => Json(json!({ "candidates": [] })).into_response(),
        Err(response) => response,
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<Value> {
    Json(json!({
        "models": [{ "name": "llama3.2:latest", "modified_at": "2024-01-01T00:00:00Z", "size": 4_000_000_000u64 }]
    }))
}

async fn handle_ollama_generate(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Response {
    let model = body["model"].as_str().unwrap_or("mock").to_string();
    match script(&state, body).await {
        Ok(reply) => Json(json!({ "model": model, "response": reply, "done": true })).into_response(),
        Err(response) => response,
    }
}

async fn handle_models() -> Json<Value> {
    Json(json!({ "object": "list", "data": [{ "id": "mock-model", "object": "model" }] }))
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Response {
    match script(&state, body).await {
        Ok(Some(text)) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        Ok(None) => Json(json!({ "choices": [] })).into_response(),
        Err(response) => response,
    }
}
