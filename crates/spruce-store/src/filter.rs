//! Metadata filters.
//!
//! A [`Filter`] is evaluated locally by the in-memory store and rendered to
//! Qdrant's filter JSON by the Qdrant store. Condition keys name metadata
//! fields; Qdrant sees them under the `metadata.` payload path.

use serde_json::{Value, json};

use crate::document::{Metadata, SCHEDULING_RULE_KEY};

/// Payload path prefix under which document metadata is stored.
const METADATA_PATH: &str = "metadata";

/// A single condition on one metadata field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The field equals `value`.
    Match { key: String, value: Value },
    /// The field is missing, null, or an empty array.
    IsEmpty { key: String },
}

impl Condition {
    pub fn matches(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Match {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn is_empty(key: impl Into<String>) -> Self {
        Condition::IsEmpty { key: key.into() }
    }

    fn holds(&self, metadata: &Metadata) -> bool {
        match self {
            Condition::Match { key, value } => metadata.get(key) == Some(value),
            Condition::IsEmpty { key } => match metadata.get(key) {
                None | Some(Value::Null) => true,
                Some(Value::Array(items)) => items.is_empty(),
                Some(_) => false,
            },
        }
    }

    fn to_qdrant(&self) -> Value {
        match self {
            Condition::Match { key, value } => json!({
                "key": format!("{METADATA_PATH}.{key}"),
                "match": { "value": value },
            }),
            Condition::IsEmpty { key } => json!({
                "is_empty": { "key": format!("{METADATA_PATH}.{key}") },
            }),
        }
    }
}

/// Conditions that must all hold (`must`) and must all fail (`must_not`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub must: Vec<Condition>,
    pub must_not: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, condition: Condition) -> Self {
        self.must.push(condition);
        self
    }

    pub fn must_not(mut self, condition: Condition) -> Self {
        self.must_not.push(condition);
        self
    }

    /// Only documents flagged as scheduling rules.
    pub fn scheduling_rules() -> Self {
        Self::new().must(Condition::matches(SCHEDULING_RULE_KEY, true))
    }

    /// Everything except documents flagged as scheduling rules.
    pub fn exclude_scheduling_rules() -> Self {
        Self::new().must_not(Condition::matches(SCHEDULING_RULE_KEY, true))
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }

    /// Evaluate the filter against a document's metadata.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.must.iter().all(|c| c.holds(metadata))
            && !self.must_not.iter().any(|c| c.holds(metadata))
    }

    /// Render as a Qdrant filter object.
    pub fn to_qdrant(&self) -> Value {
        let mut filter = serde_json::Map::new();
        if !self.must.is_empty() {
            filter.insert(
                "must".to_string(),
                Value::Array(self.must.iter().map(Condition::to_qdrant).collect()),
            );
        }
        if !self.must_not.is_empty() {
            filter.insert(
                "must_not".to_string(),
                Value::Array(self.must_not.iter().map(Condition::to_qdrant).collect()),
            );
        }
        Value::Object(filter)
    }
}
