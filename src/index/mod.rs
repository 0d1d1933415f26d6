//! Semantic index and document indexing
//!
//! Components:
//! - Render: stable text summary of a part record
//! - Store: persistent directory-backed vector index
//! - Indexer: embeds rendered records and appends them to the store

pub mod render;
pub mod store;
pub mod indexer;

pub use indexer::{DocumentIndexer, IndexReport};
pub use render::render_record;
pub use store::{IndexedUnit, ScoredUnit, SemanticIndex, SharedIndex};
