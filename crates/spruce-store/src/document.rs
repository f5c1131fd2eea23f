//! Documents stored in a collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form document metadata.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key naming where a document came from.
pub const SOURCE_KEY: &str = "source";

/// Metadata key flagging a document as a booking rule.
pub const SCHEDULING_RULE_KEY: &str = "date_time_scheduling_rule";

/// A piece of text plus metadata.
///
/// This is also the JSON payload shape written to the store:
/// `{"content": ..., "metadata": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// A document flagged as a date/time scheduling rule.
    pub fn scheduling_rule(content: impl Into<String>) -> Self {
        Self::new(content).with_metadata(SCHEDULING_RULE_KEY, true)
    }

    pub fn with_source(self, source: impl Into<String>) -> Self {
        self.with_metadata(SOURCE_KEY, source.into())
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(Value::as_str)
    }

    pub fn is_scheduling_rule(&self) -> bool {
        self.metadata
            .get(SCHEDULING_RULE_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// A similarity-search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Cosine similarity to the query; higher is closer.
    pub score: f32,
}
