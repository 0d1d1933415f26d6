//! PartAssist - retrieval-augmented answers about refrigerator and
//! dishwasher parts
//!
//! # Architecture
//!
//! - **Indexing**: part corpus -> rendered text -> embeddings -> durable index
//! - **Answering**: intent + semantic retrieval -> scoped prompt -> answer
//!   text -> best-effort product card
//! - **Surfaces**: CLI (`index`, `ask`, `serve`, `config`) and an axum HTTP layer

pub mod errors;
pub mod config;
pub mod types;
pub mod corpus;
pub mod embedding;
pub mod generation;
pub mod index;
pub mod rag;
pub mod telemetry;
pub mod server;
pub mod cli;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AssistantError, Result};
pub use index::{DocumentIndexer, SemanticIndex, SharedIndex};
pub use rag::AnswerPipeline;
pub use types::{AnswerPayload, Intent, PartRecord, ProductCard};
