//! Embedding-similarity response cache

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::cache::{
    EntryMetadata, SemanticCacheEntry, is_semantic_key_of, semantic_key, semantic_key_timestamp,
    semantic_pattern,
};
use crate::domain::semantic_cache::{BestMatch, checked_cosine_similarity};
use crate::domain::{DomainError, SemanticCacheConfig, SemanticHit, SemanticIndex};
use crate::infrastructure::observability::{CacheLayer, LookupOutcome, record_cache_lookup};
use crate::infrastructure::store::ConnectionManager;

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp, strictly increasing within this process
fn next_stamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();

    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);

    now.max(previous + 1)
}

/// Semantic index scanning every entry of a namespace in the key-value store
///
/// One key per entry (`cache:semantic:<namespace>:<stamp>`); a lookup
/// reads them all, oldest first.
#[derive(Debug)]
pub struct StoreSemanticIndex {
    connection: Arc<ConnectionManager>,
    ttl: Duration,
}

impl StoreSemanticIndex {
    pub fn new(connection: Arc<ConnectionManager>, ttl: Duration) -> Self {
        Self { connection, ttl }
    }

    async fn namespace_keys(&self, namespace: &str) -> Result<Vec<String>, DomainError> {
        let store = self.connection.ensure_connected().await?;
        let mut keys = store.scan_keys(&semantic_pattern(namespace)).await?;

        // The glob also matches nested namespaces such as `<namespace>:sub`
        keys.retain(|key| is_semantic_key_of(key, namespace));
        keys.sort_by_key(|key| (semantic_key_timestamp(key), key.clone()));

        Ok(keys)
    }
}

#[async_trait]
impl SemanticIndex for StoreSemanticIndex {
    async fn nearest(
        &self,
        namespace: &str,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<SemanticHit>, DomainError> {
        let keys = self.namespace_keys(namespace).await?;
        let store = self.connection.ensure_connected().await?;
        let mut best = BestMatch::new(threshold);

        for key in &keys {
            // Expired between scan and read
            let Some(raw) = store.get(key).await? else {
                continue;
            };

            let entry = match SemanticCacheEntry::from_json(&raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(key = %key, namespace, error = %e, "Skipping unreadable semantic entry");
                    continue;
                }
            };

            let score = match checked_cosine_similarity(embedding, &entry.embedding) {
                Ok(score) => score,
                Err(e) => {
                    debug!(key = %key, namespace, error = %e, "Skipping semantic entry");
                    continue;
                }
            };

            best.offer(score, entry);
        }

        debug!(
            namespace,
            candidates = keys.len(),
            best_score = ?best.best_score(),
            "Semantic scan complete"
        );

        Ok(best.into_best().map(|(score, entry)| SemanticHit {
            response: entry.entry.response,
            score,
            metadata: entry.entry.metadata,
        }))
    }

    async fn insert(
        &self,
        namespace: &str,
        entry: &SemanticCacheEntry,
    ) -> Result<String, DomainError> {
        let payload = entry.to_json()?;
        let key = semantic_key(namespace, next_stamp());
        let store = self.connection.ensure_connected().await?;

        store.set_ex(&key, &payload, self.ttl).await?;

        Ok(key)
    }

    async fn remove_namespace(&self, namespace: &str) -> Result<usize, DomainError> {
        let keys = self.namespace_keys(namespace).await?;
        let store = self.connection.ensure_connected().await?;
        let mut removed = 0;

        for key in &keys {
            if store.delete(key).await? {
                removed += 1;
            }
        }

        Ok(removed)
    }
}

/// Response cache matched by embedding similarity within a namespace
///
/// Every failure is logged and reported as a miss or a no-op.
#[derive(Debug)]
pub struct SemanticCache {
    index: Arc<dyn SemanticIndex>,
    config: SemanticCacheConfig,
}

impl SemanticCache {
    pub fn new(index: Arc<dyn SemanticIndex>, config: SemanticCacheConfig) -> Self {
        Self { index, config }
    }

    /// Semantic cache over the shared store connection
    pub fn with_store(connection: Arc<ConnectionManager>, config: SemanticCacheConfig) -> Self {
        let index = StoreSemanticIndex::new(connection, config.ttl());
        Self::new(Arc::new(index), config)
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    /// Best entry scoring at least the configured threshold, if any
    pub async fn lookup(&self, embedding: &[f32], namespace: &str) -> Option<SemanticHit> {
        if !self.config.enabled {
            return None;
        }

        match self
            .index
            .nearest(namespace, embedding, self.config.similarity_threshold)
            .await
        {
            Ok(Some(hit)) => {
                debug!(namespace, score = hit.score, "Semantic cache hit");
                record_cache_lookup(CacheLayer::Semantic, LookupOutcome::Hit);
                Some(hit)
            }
            Ok(None) => {
                record_cache_lookup(CacheLayer::Semantic, LookupOutcome::Miss);
                None
            }
            Err(e) => {
                warn!(namespace, error = %e, "Semantic cache lookup failed");
                record_cache_lookup(CacheLayer::Semantic, LookupOutcome::Error);
                None
            }
        }
    }

    /// Stores a response under a new key of the namespace
    pub async fn store(
        &self,
        query: &str,
        response: &str,
        embedding: Vec<f32>,
        namespace: &str,
        mut metadata: EntryMetadata,
    ) {
        if !self.config.enabled {
            return;
        }

        metadata.insert("namespace".to_string(), Value::from(namespace));
        let entry = SemanticCacheEntry::new(query, response, embedding, metadata);

        match self.index.insert(namespace, &entry).await {
            Ok(key) => debug!(key = %key, namespace, "Semantic cache entry stored"),
            Err(e) => warn!(namespace, error = %e, "Semantic cache store failed"),
        }
    }

    /// Drops every entry of a namespace, returning how many were removed
    pub async fn invalidate_namespace(&self, namespace: &str) -> usize {
        match self.index.remove_namespace(namespace).await {
            Ok(removed) => {
                debug!(namespace, removed, "Semantic namespace invalidated");
                removed
            }
            Err(e) => {
                warn!(namespace, error = %e, "Semantic namespace invalidation failed");
                0
            }
        }
    }
}
