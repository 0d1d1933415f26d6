//! Answer composition: scoped prompt assembly and generation

use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::generation::{GenerationRequest, TextGenerator};
use crate::index::ScoredUnit;
use crate::rag::context::{build_context, AssembledContext};

/// Exact reply mandated for out-of-scope questions
pub const OUT_OF_SCOPE_REPLY: &str =
    "I'm only able to help with refrigerator and dishwasher parts.";

pub const SYSTEM_PROMPT: &str = r#"You are a PartSelect Assistant. ONLY answer questions about refrigerator or dishwasher parts,
installation steps, troubleshooting, compatibility, and ordering support.
If a question is out of scope, respond: "I'm only able to help with refrigerator and dishwasher parts.""#;

pub const ANSWER_INSTRUCTIONS: &str = r#"Answer in markdown. When a specific part is relevant, include a product_card as a fenced ```json block containing exactly these fields: part_number, name, brand, image, link."#;

/// Sampling temperature used for every answer
pub const ANSWER_TEMPERATURE: f32 = 0.0;

/// Build the prompt: persona, context, question, output instructions.
pub fn build_prompt(question: &str, context: &AssembledContext) -> String {
    let mut prompt = String::with_capacity(
        SYSTEM_PROMPT.len() + context.text.len() + question.len() + ANSWER_INSTRUCTIONS.len() + 64,
    );
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n\nContext:\n");
    prompt.push_str(&context.text);
    prompt.push_str("\n\nQuestion:\n");
    prompt.push_str(question);
    prompt.push_str("\n\n");
    prompt.push_str(ANSWER_INSTRUCTIONS);
    prompt
}

/// Composes grounded answers with a text generator
pub struct AnswerComposer {
    generator: Arc<dyn TextGenerator>,
    max_tokens: usize,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn TextGenerator>, max_tokens: usize) -> Self {
        Self {
            generator,
            max_tokens,
        }
    }

    pub fn from_config(generator: Arc<dyn TextGenerator>, config: &AppConfig) -> Self {
        Self::new(generator, config.generation.max_tokens)
    }

    /// Generate the raw answer text. Generation errors propagate unchanged.
    pub async fn compose(&self, question: &str, retrieved: &[ScoredUnit]) -> Result<String> {
        let context = build_context(retrieved);
        tracing::debug!(
            context_units = context.unit_count,
            context_tokens = context.estimated_tokens,
            parts = ?context.part_numbers,
            "composing answer"
        );

        let request = GenerationRequest {
            prompt: build_prompt(question, &context),
            temperature: ANSWER_TEMPERATURE,
            max_tokens: self.max_tokens,
        };

        self.generator.generate(&request).await
    }
}
