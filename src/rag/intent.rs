//! Rule-based intent classification
//!
//! Rules are evaluated top to bottom and the first rule with a matching
//! keyword wins, so "install" beats "broken" in the same message.

use crate::types::Intent;

/// Ordered (intent, keywords) rules. Keywords are lowercase substrings.
const RULES: &[(Intent, &[&str])] = &[
    (Intent::Installation, &["install", "installation"]),
    (Intent::Compatibility, &["compatible", "model"]),
    (Intent::Troubleshooting, &["not working", "broken", "error", "issue"]),
];

/// Classify a user message. Messages matching no rule are part lookups.
pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(intent, _)| *intent)
        .unwrap_or_default()
}
