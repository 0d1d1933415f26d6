//! Integration tests for PartAssist
//!
//! Exercises indexing and answering end to end against a temporary index,
//! with in-process embedding and generation services.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use partassist::{
    embedding::Embedder,
    generation::{GenerationRequest, TextGenerator},
    index::{DocumentIndexer, SemanticIndex},
    rag::{AnswerComposer, AnswerPipeline, VectorRetriever},
    AssistantError, Intent, Result,
};
use tempfile::TempDir;

const CORPUS: &str = r#"{"part_number":"PS11752778","name":"Refrigerator Door Shelf Bin","brand":"Whirlpool","image":"https://img/bin.jpg","link":"https://parts/PS11752778","compatibility":["WRS325SDHZ"],"installation_steps":"Lift the old bin out and snap the new one in.","troubleshooting":["Cracked bin","Bin falls off"]}
{"part_number":"PS3406971","name":"Dishwasher Drain Pump","brand":"Bosch","compatibility":["SHE3AR75UC"],"installation_steps":"Disconnect power, remove the sump and swap the pump.","troubleshooting":["Water not draining","Humming noise"]}
"#;

/// Embeds by keyword presence so similarity follows topic
struct KeywordEmbedder;

const KEYWORDS: [&str; 3] = ["bin", "pump", "drain"];

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut v: Vec<f32> = KEYWORDS
                    .iter()
                    .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
                    .collect();
                v.push(0.1);
                v
            })
            .collect())
    }
}

/// Returns a fixed reply and keeps every prompt it was given
struct ScriptedGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        Ok(self.reply.clone())
    }
}

fn write_corpus(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("parts.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[tokio::test]
async fn test_index_then_answer_with_product_card() {
    let temp = TempDir::new().unwrap();
    let corpus = write_corpus(&temp, CORPUS);
    let index = SemanticIndex::open(temp.path().join("store")).unwrap().into_shared();
    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder);

    let report = DocumentIndexer::new(embedder.clone(), index.clone())
        .index_file(&corpus)
        .await
        .unwrap();
    assert_eq!(report.indexed, 2);

    let reply = "Check the pump filter first.\n\n```json\n{\"part_number\": \"PS3406971\", \"name\": \"Dishwasher Drain Pump\", \"brand\": \"Bosch\", \"image\": \"\", \"link\": \"\"}\n```";
    let generator = ScriptedGenerator::new(reply);
    let retriever = Arc::new(VectorRetriever::new(embedder, index));
    let pipeline = AnswerPipeline::new(retriever, AnswerComposer::new(generator.clone(), 200))
        .with_top_k(1);

    let payload = pipeline
        .handle("My dishwasher drain pump is not working")
        .await
        .unwrap();

    assert_eq!(payload.intent, Intent::Troubleshooting);
    assert_eq!(payload.answer_text, reply);
    let card = payload.product_card.unwrap();
    assert_eq!(card.part_number(), Some("PS3406971"));
    assert_eq!(card.brand(), Some("Bosch"));

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("Part#: PS3406971"));
    assert!(!prompts[0].contains("PS11752778"));
}

#[tokio::test]
async fn test_answer_without_card_is_not_an_error() {
    let temp = TempDir::new().unwrap();
    let index = SemanticIndex::open(temp.path()).unwrap().into_shared();
    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder);
    let generator =
        ScriptedGenerator::new("I'm only able to help with refrigerator and dishwasher parts.");
    let pipeline = AnswerPipeline::new(
        Arc::new(VectorRetriever::new(embedder, index)),
        AnswerComposer::new(generator, 200),
    );

    let payload = pipeline.handle("How do I install PS123?").await.unwrap();
    assert_eq!(payload.intent, Intent::Installation);
    assert!(payload.product_card.is_none());

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["intent"], "installation");
    assert!(json["product_card"].is_null());
}

#[tokio::test]
async fn test_reindexing_accumulates_duplicates() {
    let temp = TempDir::new().unwrap();
    let line = CORPUS.lines().next().unwrap();
    let corpus = write_corpus(&temp, line);
    let store = temp.path().join("store");
    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder);

    for expected in [1, 2] {
        let index = SemanticIndex::open(&store).unwrap().into_shared();
        let report = DocumentIndexer::new(embedder.clone(), index)
            .index_file(&corpus)
            .await
            .unwrap();
        assert_eq!(report.total_units, expected);
    }

    let reopened = SemanticIndex::open(&store).unwrap();
    assert_eq!(reopened.len(), 2);
    let hits = reopened.search(&[1.0, 0.0, 0.0, 0.1], 5).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.unit.metadata.part_number == "PS11752778"));
}

#[tokio::test]
async fn test_malformed_corpus_leaves_index_untouched() {
    let temp = TempDir::new().unwrap();
    let corpus = write_corpus(&temp, &format!("{}{{\"part_number\": 5}}\n", CORPUS));
    let store = temp.path().join("store");
    let index = SemanticIndex::open(&store).unwrap().into_shared();

    let err = DocumentIndexer::new(Arc::new(KeywordEmbedder), index.clone())
        .index_file(&corpus)
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::CorpusFormat { line: 3, .. }));
    assert!(index.read().await.is_empty());
    assert!(SemanticIndex::open(&store).unwrap().is_empty());
}
