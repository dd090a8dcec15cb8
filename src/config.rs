//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the retrieval engine: server settings, data
//! locations, the two external capability endpoints, and logging.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration file (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (`JURIS_*`)
//! 2. Configuration file
//! 3. Default values
//!
//! API tokens are never stored in the file; only the name of the environment
//! variable holding them is.

use crate::errors::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Corpus data location
    pub data: DataConfig,
    /// Embedding capability settings
    pub embedding: EmbeddingConfig,
    /// Generation capability settings
    pub generation: GenerationConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

/// Corpus data location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding one `{source}.jsonl` file per corpus
    pub data_dir: PathBuf,
}

/// Embedding capability settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Feature-extraction endpoint base URL
    pub api_url: String,
    /// Embedding model identifier
    pub model: String,
    /// Expected vector dimension
    pub dimension: usize,
    /// Request timeout; a timeout counts as an embedding failure
    pub timeout_seconds: u64,
    /// Name of the environment variable holding the API token
    pub token_env: String,
}

/// Generation capability settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Chat-completion endpoint URL
    pub api_url: String,
    /// Generation model identifier
    pub model: String,
    /// Maximum tokens per synthesis
    pub max_tokens: u32,
    /// Request timeout; a timeout counts as a synthesis failure
    pub timeout_seconds: u64,
    /// Name of the environment variable holding the API token
    pub token_env: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| RetrievalError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| RetrievalError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("JURIS_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("JURIS_PORT") {
            self.server.port = port.parse().map_err(|_| RetrievalError::Config {
                message: "Invalid port number in JURIS_PORT".to_string(),
            })?;
        }
        if let Ok(data_dir) = std::env::var("JURIS_DATA_DIR") {
            self.data.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(api_url) = std::env::var("JURIS_EMBED_URL") {
            self.embedding.api_url = api_url;
        }
        if let Ok(api_url) = std::env::var("JURIS_GENERATE_URL") {
            self.generation.api_url = api_url;
        }
        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(RetrievalError::ValidationFailed {
                field: "server.port".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }

        if self.embedding.dimension == 0 {
            return Err(RetrievalError::ValidationFailed {
                field: "embedding.dimension".to_string(),
                reason: "Vector dimension must be greater than zero".to_string(),
            });
        }

        if self.embedding.timeout_seconds == 0 || self.generation.timeout_seconds == 0 {
            return Err(RetrievalError::ValidationFailed {
                field: "timeout_seconds".to_string(),
                reason: "Capability timeouts must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Resolve the API token for a capability from its configured
    /// environment variable; empty when unset
    pub fn resolve_token(token_env: &str) -> String {
        std::env::var(token_env).unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                enable_cors: true,
            },
            data: DataConfig {
                data_dir: PathBuf::from("./data"),
            },
            embedding: EmbeddingConfig {
                api_url: "https://router.huggingface.co/hf-inference/models".to_string(),
                model: "mistral-embed".to_string(),
                dimension: 1024,
                timeout_seconds: 30,
                token_env: "HF_TOKEN".to_string(),
            },
            generation: GenerationConfig {
                api_url: "https://router.huggingface.co/v1/chat/completions".to_string(),
                model: "mistralai/Mistral-7B-Instruct-v0.3".to_string(),
                max_tokens: 1024,
                timeout_seconds: 30,
                token_env: "HF_TOKEN".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.embedding.dimension, 1024);
        assert_eq!(config.generation.max_tokens, 1024);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let mut config = Config::default();
        config.embedding.dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.embedding.model, config.embedding.model);
    }
}
