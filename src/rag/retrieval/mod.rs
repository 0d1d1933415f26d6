//! Retrieval: nearest-neighbour search over the semantic index

pub mod vector;

use async_trait::async_trait;

use crate::errors::Result;
use crate::index::ScoredUnit;

/// Units ordered by descending relevance, at most `k` long
pub type RetrievalResult = Vec<ScoredUnit>;

/// Query-to-context capability used by the pipeline
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult>;
}

pub use vector::VectorRetriever;
