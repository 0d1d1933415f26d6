//! End-to-end answer pipeline
//!
//! classify -> retrieve -> compose -> extract -> payload. Classification is
//! pure and independent of retrieval; composition waits on retrieval.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppConfig, DEFAULT_TOP_K};
use crate::errors::Result;
use crate::rag::composer::AnswerComposer;
use crate::rag::extract::extract_product_card;
use crate::rag::intent::classify;
use crate::rag::retrieval::Retriever;
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::{AnswerPayload, Intent};

/// Request-scoped answer pipeline. Holds no per-request state, so one
/// instance can serve concurrent requests.
pub struct AnswerPipeline {
    retriever: Arc<dyn Retriever>,
    composer: AnswerComposer,
    top_k: usize,
    telemetry: TelemetryCollector,
}

impl AnswerPipeline {
    pub fn new(retriever: Arc<dyn Retriever>, composer: AnswerComposer) -> Self {
        Self {
            retriever,
            composer,
            top_k: DEFAULT_TOP_K,
            telemetry: TelemetryCollector::new(),
        }
    }

    pub fn from_config(
        retriever: Arc<dyn Retriever>,
        composer: AnswerComposer,
        config: &AppConfig,
    ) -> Self {
        Self::new(retriever, composer).with_top_k(config.retrieval.top_k)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Answer one question.
    ///
    /// Retrieval and generation failures are returned as errors with no
    /// partial answer. A missing or malformed product block is not a failure.
    pub async fn handle(&self, query: &str) -> Result<AnswerPayload> {
        let started = Instant::now();
        let intent = classify(query);

        match self.answer(query, intent).await {
            Ok((payload, retrieved)) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::info!(
                    intent = %intent,
                    retrieved,
                    product_card = payload.product_card.is_some(),
                    duration_ms,
                    "answered query"
                );
                self.telemetry.record(TelemetryEvent::RequestCompleted {
                    intent,
                    retrieved,
                    product_card: payload.product_card.is_some(),
                    duration_ms,
                });
                Ok(payload)
            }
            Err(err) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::error!(intent = %intent, error = %err, duration_ms, "query failed");
                self.telemetry.record(TelemetryEvent::RequestFailed {
                    intent,
                    code: err.code(),
                    duration_ms,
                });
                Err(err)
            }
        }
    }

    async fn answer(&self, query: &str, intent: Intent) -> Result<(AnswerPayload, usize)> {
        let retrieved = self.retriever.retrieve(query, self.top_k).await?;
        let answer_text = self.composer.compose(query, &retrieved).await?;
        let product_card = extract_product_card(&answer_text);

        Ok((
            AnswerPayload {
                answer_text,
                intent,
                product_card,
            },
            retrieved.len(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AssistantError;
    use crate::generation::{GenerationRequest, TextGenerator};
    use crate::index::{IndexedUnit, ScoredUnit};
    use crate::rag::retrieval::RetrievalResult;
    use crate::types::PartRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticRetriever {
        units: Vec<ScoredUnit>,
        last_k: AtomicUsize,
    }

    #[async_trait]
    impl Retriever for StaticRetriever {
        async fn retrieve(&self, _query: &str, k: usize) -> Result<RetrievalResult> {
            self.last_k.store(k, Ordering::SeqCst);
            Ok(self.units.iter().take(k).cloned().collect())
        }
    }

    struct BrokenRetriever;

    #[async_trait]
    impl Retriever for BrokenRetriever {
        async fn retrieve(&self, _query: &str, _k: usize) -> Result<RetrievalResult> {
            Err(AssistantError::RetrievalUnavailable("index missing".into()))
        }
    }

    struct CannedGenerator(String);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn scored(number: &str) -> ScoredUnit {
        let metadata = PartRecord {
            part_number: number.to_string(),
            name: "Door Bin".to_string(),
            brand: "Whirlpool".to_string(),
            image: String::new(),
            link: String::new(),
            compatibility: vec![],
            installation_steps: String::new(),
            troubleshooting: vec![],
        };
        ScoredUnit {
            unit: IndexedUnit {
                id: number.to_string(),
                text: crate::index::render_record(&metadata),
                metadata,
                embedding: vec![1.0],
            },
            score: 0.8,
        }
    }

    fn pipeline(retriever: Arc<dyn Retriever>, answer: &str) -> AnswerPipeline {
        let composer = AnswerComposer::new(Arc::new(CannedGenerator(answer.to_string())), 200);
        AnswerPipeline::new(retriever, composer)
    }

    #[tokio::test]
    async fn test_handle_with_product_card() {
        let retriever = Arc::new(StaticRetriever {
            units: (0..6).map(|i| scored(&format!("PS{}", i))).collect(),
            last_k: AtomicUsize::new(0),
        });
        let answer = "Snap it in.\n```json\n{\"part_number\":\"PS0\",\"name\":\"Door Bin\",\"brand\":\"Whirlpool\",\"image\":\"\",\"link\":\"\"}\n```";
        let pipeline = pipeline(retriever.clone(), answer);

        let payload = pipeline.handle("How do I install PS0?").await.unwrap();
        assert_eq!(payload.intent, Intent::Installation);
        assert_eq!(payload.answer_text, answer);
        assert_eq!(payload.product_card.unwrap().part_number(), Some("PS0"));
        assert_eq!(retriever.last_k.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_malformed_card_still_succeeds() {
        let retriever = Arc::new(StaticRetriever {
            units: vec![],
            last_k: AtomicUsize::new(0),
        });
        let pipeline = pipeline(retriever, "```json\n{\"part_number\": \n```");
        let payload = pipeline.handle("What does this cost?").await.unwrap();
        assert_eq!(payload.intent, Intent::PartLookup);
        assert!(payload.product_card.is_none());
        assert_eq!(pipeline.telemetry().get_stats().empty_retrievals, 1);
    }

    #[tokio::test]
    async fn test_configured_top_k() {
        let retriever = Arc::new(StaticRetriever {
            units: vec![scored("PS1")],
            last_k: AtomicUsize::new(0),
        });
        let pipeline = pipeline(retriever.clone(), "ok").with_top_k(9);
        pipeline.handle("anything").await.unwrap();
        assert_eq!(retriever.last_k.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_surfaced() {
        let pipeline = pipeline(Arc::new(BrokenRetriever), "never used");
        let err = pipeline.handle("Is it compatible?").await.unwrap_err();
        assert!(matches!(err, AssistantError::RetrievalUnavailable(_)));

        let stats = pipeline.telemetry().get_stats();
        assert_eq!(stats.requests_failed, 1);
        assert_eq!(stats.by_intent[&Intent::Compatibility], 1);
    }
}
