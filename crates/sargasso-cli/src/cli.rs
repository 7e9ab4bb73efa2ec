//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sargasso - Turn species sightings into testable hypotheses
#[derive(Parser)]
#[command(name = "sargasso")]
#[command(about = "Marine observation correlation and hypothesis service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the user config, then built-in defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find the strongest species/condition signal and narrate it
    Analyze {
        /// Sightings CSV (one row per sighting)
        #[arg(short, long, default_value = "data/sightings.csv")]
        observations: PathBuf,

        /// Species CSV mapping ids to names
        #[arg(short, long)]
        labels: Option<PathBuf>,

        /// Report the finding only, without calling the narration gateway
        #[arg(long)]
        no_narrate: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the full correlation matrix
    Correlations {
        /// Sightings CSV (one row per sighting)
        #[arg(short, long, default_value = "data/sightings.csv")]
        observations: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Narration gateway diagnostics
    Gateway {
        #[command(subcommand)]
        action: GatewayAction,
    },

    /// Manage narration prompts
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Sightings CSV, re-read on every request
        #[arg(short, long, default_value = "data/sightings.csv")]
        observations: PathBuf,

        /// Species CSV mapping ids to names
        #[arg(short, long)]
        labels: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum GatewayAction {
    /// Check gateway health and run one sample generation
    Test {
        /// Prompt to send instead of the built-in sample
        #[arg(long)]
        prompt: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., hypothesis)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
