//! Sargasso Core Library
//!
//! Shared functionality for the Sargasso observation analysis service:
//! - Observation model and sources (in-memory, CSV)
//! - Categorical encoding, pairwise Pearson correlation, strongest-signal selection
//! - Hypothesis composition through a pluggable narration gateway
//!   (Gemini, Ollama, OpenAI-compatible servers)
//! - Prompt library for customizable narration prompts
//! - TOML configuration with environment overrides

pub mod ai;
pub mod analysis;
pub mod config;
pub mod error;
pub mod hypothesis;
pub mod models;
pub mod prompts;
pub mod source;

/// Test utilities (mock LLM server)
/// Only available with the `test-utils` feature or in test builds
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, GeminiBackend, MockBackend, OllamaBackend, OpenAICompatibleBackend};
pub use analysis::{
    analyze, find_strongest_correlation, Analysis, CategoryIndex, CorrelationMatrix, EncodedTable,
    MatrixView,
};
pub use config::{BackendKind, Config, GatewayConfig, ObservationsConfig, ServerConfig};
pub use error::{Error, Result};
pub use hypothesis::{
    HypothesisComposer, HypothesisService, GENERATION_FAILED_MESSAGE, NO_FINDING_MESSAGE,
};
pub use models::{
    CategoryId, CategoryLabel, Finding, HypothesisReport, Observation, ObservationBatch,
};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use source::{CsvSource, InMemorySource, ObservationSource};
