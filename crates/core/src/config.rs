//! Configuration management for ManualQA.
//!
//! Configuration is merged from three sources, lowest precedence first:
//! a YAML config file, environment variables, and command-line flags.
//! The session itself is in-memory only; nothing here points at a
//! persistent index location.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// Holds the collaborator endpoints and model identifiers shared by
/// every command. The RAG tuning knobs (chunk sizes, thresholds) live
/// with the knowledge crate; this struct only wires up the outside
/// world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Completion provider (e.g., "ollama", "mock")
    pub llm_provider: String,

    /// Completion model identifier
    pub llm_model: String,

    /// Embedding provider (e.g., "ollama", "mock")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// PDF-structuring provider (e.g., "remote", "mock")
    pub parser_provider: String,

    /// Endpoint of the hosted PDF-structuring service
    pub parser_endpoint: Option<String>,

    /// Endpoint of the LLM/embedding runtime
    pub llm_endpoint: Option<String>,

    /// API key for hosted collaborators
    pub api_key: Option<String>,

    /// Deadline for any single collaborator call, in seconds
    pub timeout_secs: u64,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// On-disk configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    collaborators: Option<CollaboratorsConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollaboratorsConfig {
    #[serde(rename = "llmProvider")]
    llm_provider: Option<String>,
    #[serde(rename = "llmModel")]
    llm_model: Option<String>,
    #[serde(rename = "embeddingProvider")]
    embedding_provider: Option<String>,
    #[serde(rename = "embeddingModel")]
    embedding_model: Option<String>,
    #[serde(rename = "parserProvider")]
    parser_provider: Option<String>,
    #[serde(rename = "parserEndpoint")]
    parser_endpoint: Option<String>,
    #[serde(rename = "llmEndpoint")]
    llm_endpoint: Option<String>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            llm_provider: "ollama".to_string(), // Local-first default
            llm_model: "llama3.2".to_string(),
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            parser_provider: "mock".to_string(),
            parser_endpoint: None,
            llm_endpoint: None,
            api_key: None,
            timeout_secs: 60,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `MANUALQA_CONFIG`: Path to config file
    /// - `MANUALQA_LLM_PROVIDER` / `MANUALQA_LLM_MODEL`
    /// - `MANUALQA_EMBEDDING_PROVIDER` / `MANUALQA_EMBEDDING_MODEL`
    /// - `MANUALQA_PARSER_PROVIDER` / `MANUALQA_PARSER_ENDPOINT`
    /// - `MANUALQA_LLM_ENDPOINT`
    /// - `MANUALQA_API_KEY`
    /// - `MANUALQA_TIMEOUT_SECS`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("MANUALQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // YAML file first, so environment variables can override it
        if let Some(path) = config.config_file.clone() {
            if path.exists() {
                config = config.merge_yaml(&path)?;
            } else {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
        }

        if let Ok(v) = std::env::var("MANUALQA_LLM_PROVIDER") {
            config.llm_provider = v;
        }
        if let Ok(v) = std::env::var("MANUALQA_LLM_MODEL") {
            config.llm_model = v;
        }
        if let Ok(v) = std::env::var("MANUALQA_EMBEDDING_PROVIDER") {
            config.embedding_provider = v;
        }
        if let Ok(v) = std::env::var("MANUALQA_EMBEDDING_MODEL") {
            config.embedding_model = v;
        }
        if let Ok(v) = std::env::var("MANUALQA_PARSER_PROVIDER") {
            config.parser_provider = v;
        }
        if let Ok(v) = std::env::var("MANUALQA_PARSER_ENDPOINT") {
            config.parser_endpoint = Some(v);
        }
        if let Ok(v) = std::env::var("MANUALQA_LLM_ENDPOINT") {
            config.llm_endpoint = Some(v);
        }
        config.api_key = std::env::var("MANUALQA_API_KEY").ok();

        if let Ok(v) = std::env::var("MANUALQA_TIMEOUT_SECS") {
            config.timeout_secs = v
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid MANUALQA_TIMEOUT_SECS: {}", v)))?;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(c) = config_file.collaborators {
            if let Some(v) = c.llm_provider {
                result.llm_provider = v;
            }
            if let Some(v) = c.llm_model {
                result.llm_model = v;
            }
            if let Some(v) = c.embedding_provider {
                result.embedding_provider = v;
            }
            if let Some(v) = c.embedding_model {
                result.embedding_model = v;
            }
            if let Some(v) = c.parser_provider {
                result.parser_provider = v;
            }
            if let Some(v) = c.parser_endpoint {
                result.parser_endpoint = Some(v);
            }
            if let Some(v) = c.llm_endpoint {
                result.llm_endpoint = Some(v);
            }
            if let Some(v) = c.timeout_secs {
                result.timeout_secs = v;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over both environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        llm_provider: Option<String>,
        llm_model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(cf) = config_file {
            self.config_file = Some(cf);
        }
        if let Some(p) = llm_provider {
            self.llm_provider = p;
        }
        if let Some(m) = llm_model {
            self.llm_model = m;
        }
        if let Some(l) = log_level {
            self.log_level = Some(l);
        }
        if verbose {
            self.verbose = true;
            self.log_level = Some("debug".to_string());
        }
        if no_color {
            self.no_color = true;
        }
        self
    }
}
