//! Service configuration.
//!
//! Loaded from an optional TOML file, then overridden field-by-field by
//! command-line flags and environment variables (see [`crate::args`]). Every
//! field has a default, so an empty file and no file are both valid.
//!
//! ```toml
//! bind = "0.0.0.0:8001"
//! request_timeout_secs = 120
//! log_format = "json"
//! otlp_endpoint = "http://localhost:4317"
//! preload = ["ainize/klue-bert-base-mrc"]
//!
//! [backend]
//! kind = "hosted"
//! timeout_secs = 60
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use inference::hosted::{DEFAULT_HUB_URL, DEFAULT_INFERENCE_URL};
use inference::HostedConfig;
use pipeline::ModelName;
use serde::Deserialize;
use thiserror::Error;

/// Default listen address; the client subcommands target the same port.
pub const DEFAULT_BIND: &str = "127.0.0.1:8001";

/// Environment variable consulted for the hosted backend token when the file
/// does not set one.
pub const API_TOKEN_ENV: &str = "HF_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, one line per event.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Which [`pipeline::ModelLoader`] implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// HuggingFace Hub + hosted Inference API.
    #[default]
    Hosted,
    /// Offline keyword-overlap answering.
    Lexical,
}

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub bind: String,
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
    pub backend: BackendConfig,
    /// Models registered before the server starts accepting requests.
    pub preload: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            request_timeout_secs: 120,
            log_format: LogFormat::Text,
            otlp_endpoint: None,
            backend: BackendConfig::default(),
            preload: Vec::new(),
        }
    }
}

/// Model backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub hub_url: String,
    pub inference_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    /// Lexical backend allow-list; empty accepts any model name.
    pub models: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Hosted,
            hub_url: DEFAULT_HUB_URL.to_string(),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            api_token: None,
            timeout_secs: 60,
            models: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Parses a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Checks every field that can be checked without I/O.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "backend.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.otlp_endpoint.as_deref().is_some_and(|e| e.trim().is_empty()) {
            return Err(ConfigError::Invalid("otlp_endpoint must not be empty".into()));
        }
        self.preload_models()?;
        self.backend.allowed_models()?;
        Ok(())
    }

    /// The parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bind '{}': {e}", self.bind)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The `preload` list as model names, rejecting empty entries.
    pub fn preload_models(&self) -> Result<Vec<ModelName>, ConfigError> {
        to_model_names("preload", &self.preload)
    }
}

impl BackendConfig {
    /// Connection settings for the hosted backend. Falls back to
    /// `token_from_env` when no token is configured.
    pub fn hosted(&self, token_from_env: Option<String>) -> HostedConfig {
        HostedConfig {
            hub_url: self.hub_url.clone(),
            inference_url: self.inference_url.clone(),
            api_token: self.api_token.clone().or(token_from_env),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    /// The lexical allow-list as model names, rejecting empty entries.
    pub fn allowed_models(&self) -> Result<Vec<ModelName>, ConfigError> {
        to_model_names("backend.models", &self.models)
    }
}

fn to_model_names(field: &str, values: &[String]) -> Result<Vec<ModelName>, ConfigError> {
    values
        .iter()
        .map(|v| {
            ModelName::new(v.as_str())
                .ok_or_else(|| ConfigError::Invalid(format!("{field} contains an empty model name")))
        })
        .collect()
}
