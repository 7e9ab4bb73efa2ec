//! Sargasso CLI - Marine observation hypothesis generator
//!
//! Usage:
//!   sargasso analyze --observations CSV --labels CSV   Strongest signal + hypothesis
//!   sargasso correlations --observations CSV           Full correlation matrix
//!   sargasso gateway test                              Probe the narration gateway
//!   sargasso serve --port 8000                         Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config_path = cli.config;

    match cli.command {
        Commands::Analyze {
            observations,
            labels,
            no_narrate,
            json,
        } => {
            let config = commands::load_config(config_path.as_deref())?;
            commands::cmd_analyze(
                &config,
                &observations,
                labels.as_deref(),
                no_narrate,
                json,
            )
            .await
        }
        Commands::Correlations { observations, json } => {
            let config = commands::load_config(config_path.as_deref())?;
            commands::cmd_correlations(&config, &observations, json)
        }
        Commands::Gateway { action } => match action {
            GatewayAction::Test { prompt } => {
                let config = commands::load_config(config_path.as_deref())?;
                commands::cmd_gateway_test(&config, prompt.as_deref()).await
            }
        },
        Commands::Prompts { action } => match action.unwrap_or(PromptsAction::List) {
            PromptsAction::List => commands::cmd_prompts_list(),
            PromptsAction::Show { prompt_id } => commands::cmd_prompts_show(&prompt_id),
            PromptsAction::Path => commands::cmd_prompts_path(),
        },
        Commands::Serve {
            port,
            host,
            observations,
            labels,
        } => {
            let config = commands::load_config(config_path.as_deref())?;
            commands::cmd_serve(&config, &host, port, &observations, labels.as_deref()).await
        }
    }
}
