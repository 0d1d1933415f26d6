//! Per-request query classification and the response payload

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::parts::ProductCard;

/// Coarse category of a user question
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Installation,
    Compatibility,
    Troubleshooting,
    PartLookup,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installation => "installation",
            Self::Compatibility => "compatibility",
            Self::Troubleshooting => "troubleshooting",
            Self::PartLookup => "part_lookup",
        }
    }
}

impl Default for Intent {
    fn default() -> Self {
        Self::PartLookup
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer returned for one question. Serializes to the `/chat` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerPayload {
    /// Markdown answer exactly as generated
    #[serde(rename = "answer")]
    pub answer_text: String,
    pub intent: Intent,
    pub product_card: Option<ProductCard>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_wire_names() {
        assert_eq!(serde_json::to_string(&Intent::PartLookup).unwrap(), "\"part_lookup\"");
        assert_eq!(Intent::Installation.to_string(), "installation");
    }

    #[test]
    fn test_payload_serializes_null_card() {
        let payload = AnswerPayload {
            answer_text: "Hello".to_string(),
            intent: Intent::Troubleshooting,
            product_card: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["answer"], "Hello");
        assert_eq!(value["intent"], "troubleshooting");
        assert!(value["product_card"].is_null());
    }
}
