//! Service configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/sargasso/config/sargasso.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are applied on top of whichever layer was used.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::DEFAULT_TIMEOUT;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/sargasso.toml");

/// Origin allowed by CORS when nothing is configured (Vite dev server)
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Which narration backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendKind {
    #[default]
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "openai_compatible", alias = "openai")]
    OpenAICompatible,
    #[serde(rename = "mock")]
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::OpenAICompatible => "openai_compatible",
            Self::Mock => "mock",
        }
    }

    /// Environment variable holding the API key when none is configured
    fn default_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::OpenAICompatible => Some("OPENAI_COMPATIBLE_API_KEY"),
            Self::Ollama | Self::Mock => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(Self::OpenAICompatible)
            }
            "mock" => Ok(Self::Mock),
            other => Err(Error::Config(format!("Unknown backend: {}", other))),
        }
    }
}

/// `[gateway]` section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayConfig {
    pub backend: BackendKind,
    /// Base URL; backend default when unset
    pub host: Option<String>,
    /// Model name; backend default when unset
    pub model: Option<String>,
    pub timeout_secs: u64,
    /// Environment variable to read the API key from
    pub api_key_env: Option<String>,
    /// Key supplied directly (never read from the config file)
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Gemini,
            host: None,
            model: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            api_key_env: None,
            api_key: None,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Environment variable the API key is read from: the configured one,
    /// else the backend's conventional variable
    pub fn key_env(&self) -> Option<&str> {
        self.api_key_env
            .as_deref()
            .or_else(|| self.backend.default_key_env())
    }

    /// Resolve the API key: inline key, then the process environment
    pub fn api_key(&self) -> Option<String> {
        self.api_key_from(|name| std::env::var(name).ok())
    }

    /// Resolve the API key against an arbitrary lookup
    pub fn api_key_from<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }
        lookup(self.key_env()?).filter(|k| !k.trim().is_empty())
    }
}

/// `[observations]` section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationsConfig {
    /// Column holding the category id in the observations CSV
    pub category_column: String,
    /// Environmental columns to use, in order; every other column when unset
    pub variables: Option<Vec<String>>,
    pub label_id_column: String,
    pub label_name_column: String,
}

impl Default for ObservationsConfig {
    fn default() -> Self {
        Self {
            category_column: "species_id".to_string(),
            variables: None,
            label_id_column: "id".to_string(),
            label_name_column: "name".to_string(),
        }
    }
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub observations: ObservationsConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load from the override file (or embedded defaults), then apply env
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = load_config(override_path)?;
        config.apply_env();
        Ok(config)
    }

    /// Embedded defaults only, no file or env lookups
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Apply process environment overrides
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary lookup (tests use a map)
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(backend) = get("AI_BACKEND") {
            match backend.parse::<BackendKind>() {
                Ok(kind) if kind != self.gateway.backend => {
                    // Host, model and key variable belong to the backend they
                    // were written for; the new backend starts from its defaults
                    tracing::debug!(
                        from = %self.gateway.backend,
                        to = %kind,
                        "AI_BACKEND switches backend"
                    );
                    self.gateway.backend = kind;
                    self.gateway.host = None;
                    self.gateway.model = None;
                    self.gateway.api_key_env = None;
                }
                Ok(_) => {}
                Err(_) => tracing::warn!(backend = %backend, "Ignoring unknown AI_BACKEND"),
            }
        }

        let (host_var, model_var) = match self.gateway.backend {
            BackendKind::Gemini => (Some("GEMINI_HOST"), Some("GEMINI_MODEL")),
            BackendKind::Ollama => (Some("OLLAMA_HOST"), Some("OLLAMA_MODEL")),
            BackendKind::OpenAICompatible => (
                Some("OPENAI_COMPATIBLE_HOST"),
                Some("OPENAI_COMPATIBLE_MODEL"),
            ),
            BackendKind::Mock => (None, None),
        };
        if let Some(host) = host_var.and_then(get) {
            self.gateway.host = Some(host);
        }
        if let Some(model) = model_var.and_then(get) {
            self.gateway.model = Some(model);
        }

        if let Some(origins) = get("SARGASSO_ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sargasso").join("config").join("sargasso.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<Config> {
    let path = match override_path {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };

    let content = match path {
        Some(ref p) if p.exists() => {
            tracing::debug!(path = %p.display(), "Loading config override");
            fs::read_to_string(p)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", p.display(), e)))?
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    gateway: Option<RawGateway>,
    observations: Option<RawObservations>,
    server: Option<RawServer>,
}

#[derive(Debug, Deserialize)]
struct RawGateway {
    backend: Option<String>,
    host: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    api_key_env: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawObservations {
    category_column: Option<String>,
    variables: Option<Vec<String>>,
    label_id_column: Option<String>,
    label_name_column: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    allowed_origins: Option<Vec<String>>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(gateway) = raw.gateway {
        if let Some(backend) = gateway.backend {
            config.gateway.backend = backend.parse()?;
        }
        config.gateway.host = gateway.host.filter(|h| !h.is_empty());
        config.gateway.model = gateway.model.filter(|m| !m.is_empty());
        if let Some(timeout) = gateway.timeout_secs {
            config.gateway.timeout_secs = timeout;
        }
        config.gateway.api_key_env = gateway.api_key_env.filter(|v| !v.is_empty());
    }

    if let Some(obs) = raw.observations {
        if let Some(column) = obs.category_column {
            config.observations.category_column = column;
        }
        config.observations.variables = obs.variables.filter(|v| !v.is_empty());
        if let Some(column) = obs.label_id_column {
            config.observations.label_id_column = column;
        }
        if let Some(column) = obs.label_name_column {
            config.observations.label_name_column = column;
        }
    }

    if let Some(origins) = raw.server.and_then(|s| s.allowed_origins) {
        config.server.allowed_origins = origins;
    }

    Ok(config)
}
