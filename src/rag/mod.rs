// Retrieval-augmented answer pipeline
//
// Components:
// - Intent: rule-based query categorization
// - Retrieval: semantic search over the part index
// - Context: retrieved units joined into a prompt context block
// - Composer: scoped prompt assembly and generation
// - Extract: best-effort product card parsing from the answer
// - Pipeline: end-to-end orchestration

pub mod intent;
pub mod retrieval;
pub mod context;
pub mod composer;
pub mod extract;
pub mod pipeline;

// Re-export key types
pub use composer::AnswerComposer;
pub use context::{build_context, AssembledContext};
pub use extract::extract_product_card;
pub use intent::classify;
pub use pipeline::AnswerPipeline;
pub use retrieval::{RetrievalResult, Retriever, VectorRetriever};
