//! Type definitions module
//!
//! Domain records shared by the indexer, the pipeline and the HTTP layer.

pub mod parts;
pub mod answer;

// Re-export commonly used types
pub use parts::{PartRecord, ProductCard};
pub use answer::{AnswerPayload, Intent};
