//! Embedding service clients
//!
//! The `Embedder` trait is the seam between the index and the network; the
//! concrete clients talk to an OpenAI-compatible `/embeddings` endpoint or to
//! a local Ollama server. Failures are surfaced immediately as
//! `AssistantError::Generation`, with no local retry.

pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{AppConfig, ProviderKind};
use crate::errors::{AssistantError, Result};

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

/// Turns text into fixed-length vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AssistantError::Generation("embedding service returned no vector".into()))
    }
}

/// Build the embedder selected by the configuration
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiEmbedder::from_config(config)?)),
        ProviderKind::Ollama => Ok(Arc::new(OllamaEmbedder::from_config(config)?)),
    }
}

/// Check that the service answered with one vector per input
pub(crate) fn ensure_count(got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(AssistantError::Generation(format!(
            "embedding service returned {} vectors for {} inputs",
            got, expected
        )));
    }
    Ok(())
}
