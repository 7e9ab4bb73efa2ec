//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Strongest-signal analysis, narration and the correlation table
//! - `gateway` - Narration gateway diagnostics
//! - `prompts` - Prompt library management commands
//! - `serve` - Web server command

pub mod analyze;
pub mod gateway;
pub mod prompts;
pub mod serve;

use std::path::Path;

use anyhow::{bail, Context, Result};
use sargasso_core::{Config, CsvSource};

// Re-export command functions for main.rs
pub use analyze::*;
pub use gateway::*;
pub use prompts::*;
pub use serve::*;

/// Load configuration; an explicit path must exist
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(p) = path {
        if !p.exists() {
            bail!("Config file not found: {}", p.display());
        }
    }
    Config::load(path).context("Failed to load configuration")
}

/// CSV source over the sightings file and optional species table
pub fn open_source(config: &Config, observations: &Path, labels: Option<&Path>) -> CsvSource {
    let source = CsvSource::new(observations).with_options(config.observations.clone());
    match labels {
        Some(labels) => source.with_labels(labels),
        None => source,
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
