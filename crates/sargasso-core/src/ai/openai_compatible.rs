//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - Docker Model Runner (http://localhost:12434)
//! - vLLM (http://localhost:8000)
//! - LocalAI (http://localhost:8080)
//! - llama-server / llama.cpp (http://localhost:8080)
//!
//! Host, model and key come from `[gateway]` or the `OPENAI_COMPATIBLE_*`
//! environment variables (see `config`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

use super::parsing::first_text_segment;
use super::{build_http_client, ensure_success, AIBackend, DEFAULT_TIMEOUT};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI-compatible backend
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: build_http_client(DEFAULT_TIMEOUT),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Self::new(base_url, model)
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

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: Some(0.2),
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = ensure_success("OpenAI-compatible", req_builder.send().await?).await?;
        let chat_response: ChatCompletionResponse = response.json().await?;
        let text = first_text_segment(
            chat_response
                .choices
                .into_iter()
                .map(|c| c.message.content),
        )?;
        debug!("OpenAI-compatible response: {}", text);

        Ok(text)
    }

    async fn health_check(&self) -> bool {
        // Try /v1/models first (standard OpenAI endpoint)
        if let Ok(resp) = self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
        {
            if resp.status().is_success() {
                return true;
            }
        }

        // Try /health (common for Docker Model Runner, LocalAI)
        match self
            .http_client
            .get(format!("{}/health", self.base_url))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_first_choice() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"A"}},{"message":{"role":"assistant","content":"B"}}]}"#,
        )
        .unwrap();
        let text =
            first_text_segment(body.choices.into_iter().map(|c| c.message.content)).unwrap();
        assert_eq!(text, "A");
    }

    #[test]
    fn test_with_api_key() {
        let backend =
            OpenAICompatibleBackend::with_api_key("http://localhost:8000", "llama", "secret");
        assert_eq!(backend.api_key.as_deref(), Some("secret"));
        assert_eq!(backend.model(), "llama");
    }
}
