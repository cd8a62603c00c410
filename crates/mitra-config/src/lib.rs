//! Environment-driven configuration for the evaluation server and client.
//!
//! Values are read from the process environment; binaries call
//! `dotenvy::dotenv()` first so a local `.env` file works too.

use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Keys & Defaults
// ─────────────────────────────────────────────────────────────────────────────

pub const API_KEY_VAR: &str = "API_KEY";
pub const MODEL_VAR: &str = "MITRA_MODEL";
pub const API_BASE_VAR: &str = "MITRA_API_BASE";
pub const BIND_ADDR_VAR: &str = "MITRA_BIND_ADDR";
pub const PROMPT_TEMPLATE_VAR: &str = "MITRA_PROMPT_TEMPLATE";
pub const ENDPOINT_VAR: &str = "MITRA_ENDPOINT";
pub const CONNECT_TIMEOUT_VAR: &str = "MITRA_CONNECT_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/evaluate";

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read prompt template: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ServerConfig {
    /// Provider credential. `None` is not fatal at startup; requests get a 500 instead.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub bind_addr: SocketAddr,
    pub prompt_template_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: BIND_ADDR_VAR,
            value: bind_raw.clone(),
        })?;

        Ok(Self {
            api_key: get(API_KEY_VAR),
            model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: get(API_BASE_VAR)
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            bind_addr,
            prompt_template_path: get(PROMPT_TEMPLATE_VAR).map(PathBuf::from),
        })
    }

    /// Reads the custom prompt template, if one is configured.
    pub fn load_prompt_template(&self) -> Result<Option<String>, ConfigError> {
        match &self.prompt_template_path {
            Some(path) => Ok(Some(fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key_len", &self.api_key.as_ref().map(String::len))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("bind_addr", &self.bind_addr)
            .field("prompt_template_path", &self.prompt_template_path)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), connect_timeout: None }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let connect_timeout = match get(CONNECT_TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: CONNECT_TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            endpoint: get(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            connect_timeout,
        })
    }
}
