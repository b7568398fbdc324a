//! Configuration management for hr-ask.
//!
//! Handles loading configuration from TOML files and resolving the completion
//! API credential from the environment. Every path the handlers touch lives
//! here so tests can point them at temporary directories.

use crate::error::{AppError, Result};
use crate::llm::LlmProvider;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure for hr-ask.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database file and upload directory.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Completion API settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Query execution settings.
    #[serde(default)]
    pub query: QueryConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. "127.0.0.1:8501".
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Maximum upload size in megabytes.
    #[serde(default = "default_upload_limit_mb")]
    pub upload_limit_mb: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

fn default_upload_limit_mb() -> usize {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upload_limit_mb: default_upload_limit_mb(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| AppError::config(format!("Invalid bind address '{}': {e}", self.bind)))
    }

    /// Upload limit in bytes.
    pub fn upload_limit_bytes(&self) -> usize {
        self.upload_limit_mb.saturating_mul(1024 * 1024)
    }
}

/// Locations of the durable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Directory uploaded files are written to.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
}

fn default_database() -> PathBuf {
    PathBuf::from("hr.db")
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            uploads_dir: default_uploads_dir(),
        }
    }
}

/// Completion API configuration.
///
/// `model`, `base_url` and `api_key_env` fall back to the provider's defaults
/// when left unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "groq", "openai" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name (e.g., "llama3-8b-8192").
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    pub base_url: Option<String>,

    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Parses the configured provider.
    pub fn provider(&self) -> Result<LlmProvider> {
        self.provider.parse().map_err(AppError::config)
    }

    /// Model to request, falling back to the provider default.
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider_default(LlmProvider::default_model))
    }

    /// Base URL, validated, falling back to the provider default.
    pub fn base_url(&self) -> Result<Url> {
        let raw = self
            .base_url
            .clone()
            .unwrap_or_else(|| self.provider_default(LlmProvider::default_base_url));
        let url = Url::parse(&raw)
            .map_err(|e| AppError::config(format!("Invalid LLM base URL '{raw}': {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AppError::config(format!(
                "Invalid scheme '{}' in LLM base URL. Expected 'http' or 'https'",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Environment variable holding the API key.
    pub fn api_key_env(&self) -> String {
        self.api_key_env
            .clone()
            .unwrap_or_else(|| self.provider_default(LlmProvider::default_api_key_env))
    }

    /// Reads the API key from the process environment.
    pub fn api_key(&self) -> Result<String> {
        let var = self.api_key_env();
        match std::env::var(&var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(AppError::config(format!(
                "{var} environment variable not set"
            ))),
        }
    }

    fn provider_default(&self, pick: fn(&LlmProvider) -> &'static str) -> String {
        let provider = self.provider().unwrap_or_default();
        pick(&provider).to_string()
    }
}

/// Query execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum rows returned to the page.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Reject generated statements that are not read-only.
    #[serde(default)]
    pub read_only: bool,
}

fn default_max_rows() -> usize {
    1000
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            read_only: false,
        }
    }
}

impl AppConfig {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hr-ask")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AppError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Builds a config rooted in `dir`, used by tests and demos.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            storage: StorageConfig {
                database: dir.join("hr.db"),
                uploads_dir: dir.join("uploads"),
            },
            ..Self::default()
        }
    }
}
