//! Server command implementation

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use sargasso_core::Config;

use super::open_source;

pub async fn cmd_serve(
    config: &Config,
    host: &str,
    port: u16,
    observations: &Path,
    labels: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Sargasso web server...");
    println!("   Observations: {}", observations.display());
    if let Some(labels) = labels {
        println!("   Species labels: {}", labels.display());
    }
    println!("   Listening: http://{}:{}", host, port);
    println!("   Narration backend: {}", config.gateway.backend);
    if config.server.allowed_origins.is_empty() {
        println!("   CORS: same-origin only");
    } else {
        println!("   CORS: {}", config.server.allowed_origins.join(", "));
    }
    println!();

    if !observations.exists() {
        // Not fatal: the file is read per request and may appear later
        tracing::warn!(path = %observations.display(), "Observations file does not exist yet");
    }

    let source = open_source(config, observations, labels);
    sargasso_server::serve(host, port, config, Arc::new(source))
        .await
        .context("Server error")
}
