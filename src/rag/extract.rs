//! Product card extraction from generated answers
//!
//! Best effort only: a missing block, a non-object payload or invalid JSON
//! all yield `None`. The card is never synthesized from anything other than
//! the first fenced block.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::types::ProductCard;

/// First fenced block with an optional `json` tag whose body is a `{...}`
/// span. The lazy body still extends to the last `}` before the closing
/// fence, so nested objects are captured whole.
fn fenced_json_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```(?i:json)?\s*(\{.*?\})\s*```").expect("fenced JSON pattern is valid")
    })
}

/// Extract the embedded product card, if any
pub fn extract_product_card(answer_text: &str) -> Option<ProductCard> {
    let captures = fenced_json_pattern().captures(answer_text)?;
    let body = captures.get(1)?.as_str();

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => Some(ProductCard::from_object(fields)),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed product_card block");
            None
        }
    }
}
