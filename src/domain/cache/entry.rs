//! Cached response entries

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::DomainError;

/// Metadata attached to a cached response
pub type EntryMetadata = Map<String, Value>;

/// A cached response as written by either cache layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached answer
    pub response: String,
    /// Free-form metadata (original query, namespace, model, ...)
    #[serde(default)]
    pub metadata: EntryMetadata,
    /// Write time in milliseconds since the epoch
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn new(response: impl Into<String>, metadata: EntryMetadata) -> Self {
        Self {
            response: response.into(),
            metadata,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Serializes the entry for storage
    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self).map_err(|e| {
            DomainError::serialization(format!("Failed to serialize cache entry: {}", e))
        })
    }

    /// Parses a stored entry
    pub fn from_json(data: &str) -> Result<Self, DomainError> {
        serde_json::from_str(data).map_err(|e| {
            DomainError::serialization(format!("Failed to deserialize cache entry: {}", e))
        })
    }

    /// Metadata value as a string, if present
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// A semantic cache entry: a cached response plus the embedding of its query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticCacheEntry {
    #[serde(flatten)]
    pub entry: CacheEntry,
    /// The query the response answered
    pub query: String,
    /// Embedding of `query`
    pub embedding: Vec<f32>,
}

impl SemanticCacheEntry {
    pub fn new(
        query: impl Into<String>,
        response: impl Into<String>,
        embedding: Vec<f32>,
        metadata: EntryMetadata,
    ) -> Self {
        Self {
            entry: CacheEntry::new(response, metadata),
            query: query.into(),
            embedding,
        }
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self).map_err(|e| {
            DomainError::serialization(format!("Failed to serialize semantic entry: {}", e))
        })
    }

    pub fn from_json(data: &str) -> Result<Self, DomainError> {
        serde_json::from_str(data).map_err(|e| {
            DomainError::serialization(format!("Failed to deserialize semantic entry: {}", e))
        })
    }
}

/// Result of a semantic cache hit
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticHit {
    pub response: String,
    /// Cosine similarity between the query and the stored embedding
    pub score: f32,
    pub metadata: EntryMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_entry_json_shape() {
        let mut metadata = EntryMetadata::new();
        metadata.insert("query".to_string(), json!("what is a derivative"));

        let entry = CacheEntry::new("rate of change", metadata).with_timestamp(42);
        let value: Value = serde_json::from_str(&entry.to_json().unwrap()).unwrap();

        assert_eq!(value["response"], "rate of change");
        assert_eq!(value["metadata"]["query"], "what is a derivative");
        assert_eq!(value["timestamp"], 42);
    }

    #[test]
    fn test_cache_entry_missing_metadata_defaults() {
        let entry = CacheEntry::from_json(r#"{"response":"x","timestamp":1}"#).unwrap();
        assert!(entry.metadata.is_empty());
        assert_eq!(entry.metadata_str("query"), None);
    }

    #[test]
    fn test_cache_entry_rejects_garbage() {
        let err = CacheEntry::from_json("not json").unwrap_err();
        assert!(matches!(err, DomainError::Serialization { .. }));
    }

    #[test]
    fn test_semantic_entry_is_flat() {
        let entry = SemanticCacheEntry::new("q", "A", vec![1.0, 0.0], EntryMetadata::new());
        let value: Value = serde_json::from_str(&entry.to_json().unwrap()).unwrap();

        assert_eq!(value["response"], "A");
        assert_eq!(value["query"], "q");
        assert_eq!(value["embedding"], json!([1.0, 0.0]));
        assert!(value.get("entry").is_none());
    }
}
