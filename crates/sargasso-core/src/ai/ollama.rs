//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint (non-streaming).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

use super::parsing::first_text_segment;
use super::{build_http_client, ensure_success, AIBackend, DEFAULT_TIMEOUT};

pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: build_http_client(DEFAULT_TIMEOUT),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a new instance with a different request timeout
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            http_client: build_http_client(timeout),
            timeout,
            ..self.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: Option<String>,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        let response = ensure_success("Ollama", response).await?;
        let ollama_response: OllamaResponse = response.json().await?;
        let text = first_text_segment([ollama_response.response])?;
        debug!("Ollama response: {}", text);

        Ok(text)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
