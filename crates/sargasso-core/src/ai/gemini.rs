//! Google Gemini backend implementation
//!
//! Calls the `generateContent` endpoint of the Generative Language API and
//! reads `candidates[0].content.parts[0].text` from the reply.
//!
//! Built through `AIClient::from_config`; `GEMINI_API_KEY`, `GEMINI_MODEL`
//! and `GEMINI_HOST` are applied by the config layer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::parsing::first_text_segment;
use super::{build_http_client, ensure_success, AIBackend, DEFAULT_TIMEOUT};

pub const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Gemini backend (hosted API, key-authenticated)
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http_client: build_http_client(DEFAULT_TIMEOUT),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
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

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model)
    }
}

/// Request to the generateContent endpoint
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// Response from the generateContent endpoint
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, in order
    fn into_segments(self) -> Vec<Option<String>> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .http_client
            .post(format!("{}:generateContent", self.model_url()))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        // The key rides in the query string; keep it out of error messages
        let response = ensure_success("Gemini", response).await?;
        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;
        let text = first_text_segment(body.into_segments())?;
        debug!("Gemini response: {}", text);

        Ok(text)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(self.model_url())
            .query(&[("key", self.api_key.as_str())])
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
