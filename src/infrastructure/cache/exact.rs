//! Exact-match response cache

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::cache::EntryMetadata;
use crate::domain::{CacheEntry, CacheKeyGenerator, DirectKeyGenerator, DomainError};
use crate::infrastructure::observability::{CacheLayer, LookupOutcome, record_cache_lookup};
use crate::infrastructure::store::ConnectionManager;

/// Configuration for the exact-match cache
#[derive(Debug, Clone, Deserialize)]
pub struct ExactCacheConfig {
    /// Whether exact caching is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Expiry set on every write, in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for ExactCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl ExactCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Response cache keyed by the normalized query and namespace
///
/// The cache is an optimization: every failure is logged and reported
/// as a miss (lookups) or a no-op (writes).
#[derive(Debug)]
pub struct ExactCache {
    connection: Arc<ConnectionManager>,
    key_generator: Arc<dyn CacheKeyGenerator>,
    config: ExactCacheConfig,
}

impl ExactCache {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self::with_config(connection, ExactCacheConfig::default())
    }

    pub fn with_config(connection: Arc<ConnectionManager>, config: ExactCacheConfig) -> Self {
        Self {
            connection,
            key_generator: Arc::new(DirectKeyGenerator::new()),
            config,
        }
    }

    pub fn with_key_generator(mut self, key_generator: Arc<dyn CacheKeyGenerator>) -> Self {
        self.key_generator = key_generator;
        self
    }

    pub fn config(&self) -> &ExactCacheConfig {
        &self.config
    }

    /// Store key for a query within a namespace
    pub fn key_for(&self, query: &str, namespace: &str) -> String {
        self.key_generator.generate(query, namespace)
    }

    /// Looks up a cached response; failures are reported as a miss
    pub async fn lookup(&self, query: &str, namespace: &str) -> Option<CacheEntry> {
        if !self.config.enabled {
            return None;
        }

        let key = self.key_for(query, namespace);

        match self.fetch(&key).await {
            Ok(Some(entry)) => {
                debug!(key = %key, namespace, "Exact cache hit");
                record_cache_lookup(CacheLayer::Exact, LookupOutcome::Hit);
                Some(entry)
            }
            Ok(None) => {
                record_cache_lookup(CacheLayer::Exact, LookupOutcome::Miss);
                None
            }
            Err(e) => {
                warn!(key = %key, namespace, error = %e, "Exact cache lookup failed");
                record_cache_lookup(CacheLayer::Exact, LookupOutcome::Error);
                None
            }
        }
    }

    async fn fetch(&self, key: &str) -> Result<Option<CacheEntry>, DomainError> {
        let store = self.connection.ensure_connected().await?;

        match store.get(key).await? {
            Some(raw) => CacheEntry::from_json(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Caches a response, resetting the entry's expiry
    ///
    /// The original query and namespace are recorded in the metadata so a
    /// hash collision can be told apart from a genuine hit.
    pub async fn store(
        &self,
        query: &str,
        response: &str,
        namespace: &str,
        mut metadata: EntryMetadata,
    ) {
        if !self.config.enabled {
            return;
        }

        let key = self.key_for(query, namespace);
        metadata.insert("query".to_string(), Value::from(query));
        metadata.insert("namespace".to_string(), Value::from(namespace));

        let entry = CacheEntry::new(response, metadata);

        if let Err(e) = self.write(&key, &entry).await {
            warn!(key = %key, namespace, error = %e, "Exact cache store failed");
        } else {
            debug!(key = %key, namespace, "Exact cache entry stored");
        }
    }

    async fn write(&self, key: &str, entry: &CacheEntry) -> Result<(), DomainError> {
        let payload = entry.to_json()?;
        let store = self.connection.ensure_connected().await?;

        store.set_ex(key, &payload, self.config.ttl()).await
    }

    /// Removes the entry for a query; returns whether one existed
    pub async fn invalidate(&self, query: &str, namespace: &str) -> bool {
        let key = self.key_for(query, namespace);

        let result = match self.connection.ensure_connected().await {
            Ok(store) => store.delete(&key).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            warn!(key = %key, namespace, error = %e, "Exact cache invalidation failed");
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::KeyValueStore;
    use crate::domain::cache::FailingStore;
    use crate::infrastructure::store::{InMemoryConnector, InMemoryStore, MockConnector};

    fn cache_over(store: Arc<InMemoryStore>) -> ExactCache {
        let connector = Arc::new(InMemoryConnector::with_store(store));
        ExactCache::new(Arc::new(ConnectionManager::new(connector)))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = cache_over(Arc::new(InMemoryStore::new()));

        cache
            .store("what is energy", "capacity to do work", "physics", EntryMetadata::new())
            .await;

        let entry = cache.lookup("what is energy", "physics").await.unwrap();
        assert_eq!(entry.response, "capacity to do work");
        assert_eq!(entry.metadata_str("query"), Some("what is energy"));
        assert_eq!(entry.metadata_str("namespace"), Some("physics"));
    }

    #[tokio::test]
    async fn test_case_and_whitespace_insensitive_hit() {
        let cache = cache_over(Arc::new(InMemoryStore::new()));

        cache
            .store("what is a derivative", "rate of change", "math", EntryMetadata::new())
            .await;

        let entry = cache.lookup("  What Is A Derivative  ", "math").await.unwrap();
        assert_eq!(entry.response, "rate of change");
    }

    #[tokio::test]
    async fn test_namespaces_do_not_cross_match() {
        let cache = cache_over(Arc::new(InMemoryStore::new()));

        cache
            .store("what is energy", "capacity to do work", "physics", EntryMetadata::new())
            .await;

        assert!(cache.lookup("what is energy", "economics").await.is_none());
    }

    #[tokio::test]
    async fn test_store_sets_expiry() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_over(store.clone());

        cache.store("q", "a", "ns", EntryMetadata::new()).await;

        let ttl = store.ttl(&cache.key_for("q", "ns")).unwrap();
        assert!(ttl > Duration::from_secs(86_000));
        assert!(ttl <= Duration::from_secs(86_400));
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let store = Arc::new(InMemoryStore::new());
        let connector = Arc::new(InMemoryConnector::with_store(store.clone()));
        let cache = ExactCache::with_config(
            Arc::new(ConnectionManager::new(connector)),
            ExactCacheConfig::default().with_ttl(Duration::from_secs(60)),
        );

        cache.store("q", "a", "ns", EntryMetadata::new()).await;

        assert!(store.ttl(&cache.key_for("q", "ns")).unwrap() <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_over(store.clone());

        store
            .set_ex(&cache.key_for("q", "ns"), "{not json", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.lookup("q", "ns").await.is_none());
    }

    #[tokio::test]
    async fn test_store_failures_are_absorbed() {
        let connector = MockConnector::new().with_store(Arc::new(FailingStore::new("down")));
        let cache = ExactCache::new(Arc::new(ConnectionManager::new(Arc::new(connector))));

        cache.store("q", "a", "ns", EntryMetadata::new()).await;

        assert!(cache.lookup("q", "ns").await.is_none());
        assert!(!cache.invalidate("q", "ns").await);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_a_miss() {
        let connector = MockConnector::new().failing(usize::MAX);
        let cache = ExactCache::new(Arc::new(ConnectionManager::new(Arc::new(connector))));

        assert!(cache.lookup("q", "ns").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = cache_over(Arc::new(InMemoryStore::new()));

        cache.store("q", "a", "ns", EntryMetadata::new()).await;

        assert!(cache.invalidate("Q ", "ns").await);
        assert!(cache.lookup("q", "ns").await.is_none());
        assert!(!cache.invalidate("q", "ns").await);
    }

    #[tokio::test]
    async fn test_disabled_cache_never_hits() {
        let connector = Arc::new(InMemoryConnector::new());
        let cache = ExactCache::with_config(
            Arc::new(ConnectionManager::new(connector)),
            ExactCacheConfig::default().disabled(),
        );

        cache.store("q", "a", "ns", EntryMetadata::new()).await;

        assert!(cache.lookup("q", "ns").await.is_none());
    }
}
