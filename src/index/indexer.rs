//! Document indexer: part records -> rendered text -> embeddings -> index

use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::corpus;
use crate::embedding::Embedder;
use crate::errors::{AssistantError, Result};
use crate::index::render::render_record;
use crate::index::store::{IndexedUnit, SharedIndex};
use crate::types::PartRecord;

/// Texts sent to the embedding service per request
const EMBED_BATCH: usize = 32;

/// Progress callback: (records embedded so far, total records)
pub type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Summary of one indexing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexReport {
    pub indexed: usize,
    pub total_units: usize,
}

/// Builds indexed units from part records and appends them to the index
pub struct DocumentIndexer {
    embedder: Arc<dyn Embedder>,
    index: SharedIndex,
    progress: Option<ProgressFn>,
}

impl DocumentIndexer {
    pub fn new(embedder: Arc<dyn Embedder>, index: SharedIndex) -> Self {
        Self {
            embedder,
            index,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Index every record.
    ///
    /// All embeddings are computed before the index write lock is taken, and
    /// the units are persisted in one durable append, so a failed run leaves
    /// the stored index unchanged. Records already present are indexed again.
    pub async fn index(&self, records: &[PartRecord]) -> Result<IndexReport> {
        if records.is_empty() {
            let total_units = self.index.read().await.len();
            return Ok(IndexReport {
                indexed: 0,
                total_units,
            });
        }

        let texts: Vec<String> = records.iter().map(render_record).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH) {
            let vectors = self.embedder.embed(batch).await?;
            if vectors.len() != batch.len() {
                return Err(AssistantError::Generation(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            embeddings.extend(vectors);
            if let Some(progress) = &self.progress {
                progress(embeddings.len(), texts.len());
            }
        }

        let units: Vec<IndexedUnit> = records
            .iter()
            .zip(texts)
            .zip(embeddings)
            .map(|((record, text), embedding)| IndexedUnit {
                id: Uuid::new_v4().to_string(),
                text,
                metadata: record.clone(),
                embedding,
            })
            .collect();

        let indexed = units.len();
        let mut index = self.index.write().await;
        index.add(units)?;
        let total_units = index.len();

        tracing::info!(indexed, total_units, "indexing complete");
        Ok(IndexReport {
            indexed,
            total_units,
        })
    }

    /// Load a JSONL corpus and index it. A malformed corpus fails before
    /// anything is embedded or written.
    pub async fn index_file(&self, path: &Path) -> Result<IndexReport> {
        let records = corpus::load_records(path)?;
        self.index(&records).await
    }
}
