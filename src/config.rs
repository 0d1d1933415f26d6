//! Configuration management for PartAssist
//!
//! TOML-based configuration with defaults, environment overrides and
//! validation. Location: ~/.partassist/config.toml
//!
//! The configuration is resolved once at startup, validated, and then shared
//! read-only (usually behind an `Arc`) with every component that needs
//! credentials or endpoints.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{AssistantError, Result};

pub const DEFAULT_TOP_K: usize = 4;

/// Backend used for both embeddings and answer generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Ollama,
}

impl std::str::FromStr for ProviderKind {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(AssistantError::Config(format!(
                "unsupported provider '{}'; use openai or ollama",
                other
            ))),
        }
    }
}

/// Complete configuration for PartAssist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub openai: OpenAiConfig,
    pub ollama: OllamaConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// OpenAI-compatible endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub timeout_secs: u64,
}

/// Local Ollama server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub timeout_secs: u64,
}

/// Semantic index and corpus locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub dir: PathBuf,
    pub corpus: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

/// Answer model settings. Sampling temperature is fixed at 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Re-index the corpus before accepting traffic
    pub index_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            chat_model: "qwen2.5:7b-instruct".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./vector_store"),
            corpus: PathBuf::from("data/parts.jsonl"),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { max_tokens: 800 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            index_on_start: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file or use defaults, then apply the
    /// process environment. Does not validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(config_path) => Self::load_from_file(config_path)?,
            None => Self::load_default()?,
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AssistantError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents)
            .map_err(|e| AssistantError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from the standard location or fall back to built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(AppConfig::default())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".partassist").join("config.toml"))
    }

    /// Override settings from environment variables.
    ///
    /// `lookup` is the variable source so callers can substitute a fixed map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.openai.api_key = Some(key);
        }
        if let Some(provider) = lookup("PARTASSIST_PROVIDER") {
            self.provider = provider.parse()?;
        }
        if let Some(dir) = lookup("PARTASSIST_INDEX_DIR") {
            self.index.dir = PathBuf::from(dir);
        }
        if let Some(corpus) = lookup("PARTASSIST_CORPUS") {
            self.index.corpus = PathBuf::from(corpus);
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.provider == ProviderKind::OpenAi && self.openai_api_key().is_none() {
            return Err(AssistantError::Config(
                "OPENAI_API_KEY must be set for the openai provider".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AssistantError::Config(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }

        if self.generation.max_tokens == 0 {
            return Err(AssistantError::Config(
                "generation.max_tokens must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Trimmed API key, if one is configured
    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Render as TOML with the API key masked
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut copy = self.clone();
        if copy.openai.api_key.is_some() {
            copy.openai.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&copy)
            .map_err(|e| AssistantError::Config(format!("Failed to serialize config: {}", e)))
    }
}
