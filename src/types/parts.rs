//! Part records and the product card projected from them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One appliance part as supplied by the document source.
///
/// `image` and `link` are optional in the corpus and default to empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartRecord {
    pub part_number: String,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub link: String,
    pub compatibility: Vec<String>,
    pub installation_steps: String,
    pub troubleshooting: Vec<String>,
}

/// Structured product reference embedded by the model in its answer.
///
/// Kept as the parsed JSON object verbatim: the model may omit fields or add
/// extra ones and the card is still passed through unchanged. Use the typed
/// accessors to read the expected fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ProductCard(Map<String, Value>);

impl ProductCard {
    pub fn from_object(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn part_number(&self) -> Option<&str> {
        self.str_field("part_number")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn brand(&self) -> Option<&str> {
        self.str_field("brand")
    }

    pub fn image(&self) -> Option<&str> {
        self.str_field("image")
    }

    pub fn link(&self) -> Option<&str> {
        self.str_field("link")
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}
