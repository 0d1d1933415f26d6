//! Context block assembly for answer prompts

use crate::index::ScoredUnit;

/// Separator placed between unit texts
const UNIT_SEPARATOR: &str = "\n\n";

/// Context assembled from a retrieval result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    /// Unit texts in retrieval order
    pub text: String,
    pub unit_count: usize,
    /// Rough token count (~4 chars per token)
    pub estimated_tokens: usize,
    pub part_numbers: Vec<String>,
}

/// Concatenate the text of every retrieved unit, preserving order.
/// Nothing is dropped or reordered.
pub fn build_context(units: &[ScoredUnit]) -> AssembledContext {
    let text = units
        .iter()
        .map(|scored| scored.unit.text.as_str())
        .collect::<Vec<_>>()
        .join(UNIT_SEPARATOR);

    AssembledContext {
        estimated_tokens: text.len() / 4,
        unit_count: units.len(),
        part_numbers: units
            .iter()
            .map(|scored| scored.unit.metadata.part_number.clone())
            .collect(),
        text,
    }
}
