//! Record types consumed by the tagging engine
//!
//! The engine only needs three things from a record: its timestamp, its tags
//! in order, and a way to add a tag. Hosts with their own metric type
//! implement [`Record`]; [`Metric`] is the crate's own JSON-lines shape.

use serde::{Deserialize, Serialize};

/// What the tagging engine needs from a host record
pub trait Record {
    /// Unix timestamp in seconds
    fn timestamp(&self) -> i64;

    /// Tags as (key, value) pairs, in record order
    fn tags(&self) -> Vec<(&str, &str)>;

    /// Add a tag, replacing the value if the key is already present
    fn add_tag(&mut self, key: &str, value: &str);
}

/// A single tag key/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A metric observation with ordered tags
///
/// ```text
/// {"name":"traffic","timestamp":1700000000,
///  "tags":[{"key":"country_code","value":"NZ"}],
///  "fields":{"bytes":1200}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Measurement name
    pub name: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Tags in insertion order
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Measured values, passed through untouched
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Metric {
    pub fn new(name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            timestamp,
            tags: Vec::new(),
            fields: serde_json::Map::new(),
        }
    }

    /// Builder method: add a tag
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    /// Builder method: add a field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Value of the first tag with `key`
    pub fn get_tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }
}

impl Record for Metric {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn tags(&self) -> Vec<(&str, &str)> {
        self.tags
            .iter()
            .map(|tag| (tag.key.as_str(), tag.value.as_str()))
            .collect()
    }

    fn add_tag(&mut self, key: &str, value: &str) {
        match self.tags.iter_mut().find(|tag| tag.key == key) {
            Some(existing) => existing.value = value.to_string(),
            None => self.tags.push(Tag::new(key, value)),
        }
    }
}
