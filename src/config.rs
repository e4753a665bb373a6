//! Configuration management for sql-chat.
//!
//! Handles loading configuration from TOML files, with environment
//! variables (including a `.env` file loaded at startup) and CLI flags
//! layered on top by the binary.

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for sql-chat.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Default connection form values.
    #[serde(default)]
    pub connection: ConnectionDefaults,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "groq" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key stored in the config file. Prefer the GROQ_API_KEY
    /// environment variable; this field is a fallback.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_model() -> String {
    crate::llm::groq::DEFAULT_MODEL.to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Resolves the API key with manual-override precedence:
    /// explicit override (CLI) → GROQ_API_KEY environment variable →
    /// config file.
    pub fn resolve_api_key(&self, override_key: Option<String>) -> Option<String> {
        override_key
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .or_else(|| self.api_key.clone())
    }
}

/// Default values for the connection form, mirroring a typical local
/// MySQL setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDefaults {
    #[serde(default = "default_host")]
    pub host: String,

    /// Kept textual; validation happens when a connection is attempted.
    #[serde(default = "default_port")]
    pub port: String,

    #[serde(default = "default_user")]
    pub user: String,

    /// Database to connect to at startup, if any.
    #[serde(default)]
    pub database: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> String {
    "3306".to_string()
}

fn default_user() -> String {
    "root".to_string()
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            database: None,
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sql-chat")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ChatError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
