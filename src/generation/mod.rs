//! Text generation service clients
//!
//! Answer composition only needs "prompt in, text out"; `TextGenerator` is
//! that capability. Calls are made once per request with no local retry and
//! failures surface as `AssistantError::Generation`.

pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{AppConfig, ProviderKind};
use crate::errors::Result;

pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;

/// Request envelope shared by the providers
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// Produces raw model text for a fully assembled prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Build the generator selected by the configuration
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn TextGenerator>> {
    match config.provider {
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiGenerator::from_config(config)?)),
        ProviderKind::Ollama => Ok(Arc::new(OllamaGenerator::from_config(config)?)),
    }
}
