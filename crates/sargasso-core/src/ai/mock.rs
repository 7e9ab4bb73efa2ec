//! Mock backend for testing
//!
//! Returns a scripted reply, or fails, or stalls, without a running LLM server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

const DEFAULT_REPLY: &str = "Presence of this species appears linked to the observed environmental \
     conditions, which merits further field investigation.";

/// Mock AI backend for testing
///
/// Clones share the call counter and the last prompt seen.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Reply text; `None` makes every generation fail
    reply: Option<String>,
    /// Artificial latency before replying
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            reply: Some(DEFAULT_REPLY.to_string()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    /// Mock that answers every prompt with `reply`
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            ..Self::new()
        }
    }

    /// Mock whose every generation fails
    pub fn failing() -> Self {
        Self {
            healthy: false,
            reply: None,
            ..Self::new()
        }
    }

    /// Mock that waits `delay` before replying
    pub fn hanging(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Number of `generate` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent prompt passed to `generate`
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.reply
            .clone()
            .ok_or_else(|| Error::Generation("mock backend configured to fail".into()))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
