//! Retriever backed by the local semantic index

use async_trait::async_trait;
use std::sync::Arc;

use super::{RetrievalResult, Retriever};
use crate::embedding::Embedder;
use crate::errors::Result;
use crate::index::SharedIndex;

/// Embeds the query and searches the shared index under a read lock
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder>,
    index: SharedIndex,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: SharedIndex) -> Self {
        Self { embedder, index }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Ok(Vec::new());
        }
        // Skips the embedding round trip only; the answer comes from the
        // single guard taken below.
        if self.index.read().await.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_one(query).await?;

        let index = self.index.read().await;
        if index.is_empty() {
            return Ok(Vec::new());
        }
        let results = index.search(&query_embedding, k)?;
        drop(index);

        tracing::debug!(
            k,
            returned = results.len(),
            top_score = results.first().map(|r| r.score),
            "retrieved context"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AssistantError;
    use crate::index::{IndexedUnit, SemanticIndex};
    use crate::types::PartRecord;
    use async_trait::async_trait;
    use quickcheck_macros::quickcheck;
    use tempfile::TempDir;

    /// Maps text onto two axes: fridge-ish and dishwasher-ish words
    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    let fridge = ["fridge", "refrigerator", "ice", "door"]
                        .iter()
                        .filter(|w| t.contains(*w))
                        .count() as f32;
                    let dish = ["dishwasher", "spray", "rack"]
                        .iter()
                        .filter(|w| t.contains(*w))
                        .count() as f32;
                    vec![fridge + 0.01, dish + 0.01]
                })
                .collect())
        }
    }

    struct UnreachableEmbedder;

    #[async_trait]
    impl Embedder for UnreachableEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(AssistantError::Generation("connection refused".into()))
        }
    }

    fn unit(name: &str, embedding: Vec<f32>) -> IndexedUnit {
        IndexedUnit {
            id: name.to_string(),
            text: name.to_string(),
            metadata: PartRecord {
                part_number: name.to_string(),
                name: name.to_string(),
                brand: "Whirlpool".to_string(),
                image: String::new(),
                link: String::new(),
                compatibility: vec![],
                installation_steps: String::new(),
                troubleshooting: vec![],
            },
            embedding,
        }
    }

    fn populated(temp: &TempDir) -> SharedIndex {
        let mut index = SemanticIndex::open(temp.path()).unwrap();
        index
            .add(vec![
                unit("ice maker", vec![1.0, 0.0]),
                unit("spray arm", vec![0.0, 1.0]),
                unit("door bin", vec![0.9, 0.1]),
            ])
            .unwrap();
        index.into_shared()
    }

    #[tokio::test]
    async fn test_retrieve_most_similar_first() {
        let temp = TempDir::new().unwrap();
        let retriever = VectorRetriever::new(Arc::new(AxisEmbedder), populated(&temp));

        let results = retriever.retrieve("dishwasher spray arm", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].unit.id, "spray arm");
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty_without_embedding() {
        let temp = TempDir::new().unwrap();
        let index = SemanticIndex::open(temp.path()).unwrap().into_shared();
        let retriever = VectorRetriever::new(Arc::new(UnreachableEmbedder), index);
        assert!(retriever.retrieve("anything", 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let retriever = VectorRetriever::new(Arc::new(UnreachableEmbedder), populated(&temp));
        let err = retriever.retrieve("ice", 4).await.unwrap_err();
        assert!(matches!(err, AssistantError::Generation(_)));
    }

    /// Appends a unit to the index while the query is being embedded
    struct ReindexingEmbedder {
        index: SharedIndex,
    }

    #[async_trait]
    impl Embedder for ReindexingEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.index
                .write()
                .await
                .add(vec![unit("water filter", vec![0.5, 0.5])])?;
            Ok(texts.iter().map(|_| vec![0.5, 0.5]).collect())
        }
    }

    #[tokio::test]
    async fn test_search_sees_index_as_of_query_embedding() {
        let temp = TempDir::new().unwrap();
        let index = populated(&temp);
        let retriever = VectorRetriever::new(
            Arc::new(ReindexingEmbedder {
                index: index.clone(),
            }),
            index.clone(),
        );

        let results = retriever.retrieve("filter", 10).await.unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].unit.id, "water filter");
    }

    #[quickcheck]
    fn prop_result_never_exceeds_k(query: String, k: u8) -> bool {
        let temp = TempDir::new().unwrap();
        let retriever = VectorRetriever::new(Arc::new(AxisEmbedder), populated(&temp));
        let k = k as usize;
        let results = tokio_test::block_on(retriever.retrieve(&query, k)).unwrap();
        results.len() <= k && results.len() <= 3
    }
}
