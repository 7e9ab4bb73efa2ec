//! Pluggable narration backend abstraction
//!
//! The narration gateway turns a rendered prompt into a single piece of
//! generated text. The hosted Gemini API is the default; local Ollama and
//! OpenAI-compatible servers are supported for offline use.
//!
//! # Architecture
//!
//! - `AIBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OllamaBackend`,
//!   `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let ai = AIClient::from_config(&config.gateway)?;
//! let text = ai.generate("Summarise this finding ...").await?;
//! ```
//!
//! # Configuration
//!
//! Environment variables (applied by `Config::apply_env`):
//! - `AI_BACKEND`: Backend to use (gemini, ollama, openai_compatible, mock). Default: gemini
//! - `GEMINI_API_KEY` / `GEMINI_MODEL` / `GEMINI_HOST`: Gemini credentials, model and base URL
//! - `OLLAMA_HOST` / `OLLAMA_MODEL`: Ollama server URL and model
//! - `OPENAI_COMPATIBLE_HOST` / `OPENAI_COMPATIBLE_MODEL` / `OPENAI_COMPATIBLE_API_KEY`

mod gemini;
mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;

pub use gemini::{GeminiBackend, DEFAULT_GEMINI_HOST, DEFAULT_GEMINI_MODEL};
pub use mock::MockBackend;
pub use ollama::{OllamaBackend, DEFAULT_OLLAMA_MODEL};
pub use openai_compatible::{OpenAICompatibleBackend, DEFAULT_OPENAI_MODEL};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

use crate::config::{BackendKind, GatewayConfig};
use crate::error::{Error, Result};

/// Request timeout used when nothing else is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait defining the interface for all narration backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send one prompt and return the first text segment of the reply
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini (hosted, default)
    Gemini(GeminiBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (Docker Model Runner, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Build a client from the `[gateway]` configuration section
    ///
    /// Fails with `Error::Config` when the selected backend is missing
    /// something it cannot run without (a Gemini key, an Ollama host).
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let timeout = config.timeout();

        let client = match config.backend {
            BackendKind::Gemini => {
                let api_key = config.api_key().ok_or_else(|| {
                    Error::Config(format!(
                        "Gemini backend requires an API key in ${}",
                        config.key_env().unwrap_or("GEMINI_API_KEY")
                    ))
                })?;
                let host = config.host.as_deref().unwrap_or(DEFAULT_GEMINI_HOST);
                let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
                AIClient::Gemini(GeminiBackend::new(host, model, &api_key).with_timeout(timeout))
            }
            BackendKind::Ollama => {
                let host = config.host.as_deref().ok_or_else(|| {
                    Error::Config("Ollama backend requires gateway.host".into())
                })?;
                let model = config.model.as_deref().unwrap_or(DEFAULT_OLLAMA_MODEL);
                AIClient::Ollama(OllamaBackend::new(host, model).with_timeout(timeout))
            }
            BackendKind::OpenAICompatible => {
                let host = config.host.as_deref().ok_or_else(|| {
                    Error::Config("OpenAI-compatible backend requires gateway.host".into())
                })?;
                let model = config.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
                let backend = match config.api_key() {
                    Some(key) => OpenAICompatibleBackend::with_api_key(host, model, &key),
                    None => OpenAICompatibleBackend::new(host, model),
                };
                AIClient::OpenAICompatible(backend.with_timeout(timeout))
            }
            BackendKind::Mock => AIClient::Mock(MockBackend::new()),
        };

        tracing::debug!(
            backend = %config.backend,
            model = client.model(),
            host = client.host(),
            "Narration gateway configured"
        );
        Ok(client)
    }

    /// Create a Gemini backend directly
    pub fn gemini(host: &str, model: &str, api_key: &str) -> Self {
        AIClient::Gemini(GeminiBackend::new(host, model, api_key))
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Short backend name for logs and health output
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Gemini(_) => "gemini",
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.generate(prompt).await,
            AIClient::Ollama(b) => b.generate(prompt).await,
            AIClient::OpenAICompatible(b) => b.generate(prompt).await,
            AIClient::Mock(b) => b.generate(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// Build the shared HTTP client with a request timeout
pub(crate) fn build_http_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
        Client::new()
    })
}

/// Map a non-2xx response into a generation error carrying the body
pub(crate) async fn ensure_success(backend: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Generation(format!(
        "{} returned {}: {}",
        backend,
        status,
        parsing::preview(&body)
    )))
}
