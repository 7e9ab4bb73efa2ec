//! Error types for Sargasso

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Narration gateway timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
