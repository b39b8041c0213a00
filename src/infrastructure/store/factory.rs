//! Store factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::DomainError;

use super::connection::{ConnectionManager, StoreConnector};
use super::in_memory::InMemoryConnector;
use super::redis::{RedisConnector, RedisStoreConfig};

/// Supported store backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// In-process store, lost on restart
    #[default]
    InMemory,
    /// Redis server
    Redis,
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::InMemory => write!(f, "in_memory"),
            StoreType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreType::InMemory),
            "redis" => Ok(StoreType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown store type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// Key-value store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to connect to
    pub store_type: StoreType,
    /// Redis URL (required for the Redis backend)
    pub redis_url: Option<String>,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Upper bound on a single connect attempt
    pub connection_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::InMemory,
            redis_url: None,
            key_prefix: None,
            connection_timeout_secs: 5,
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            store_type: StoreType::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs.max(1))
    }
}

/// Factory for store connectors and connection managers
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates the connector for the configured backend without connecting
    pub fn connector(&self, config: &StoreConfig) -> Result<Arc<dyn StoreConnector>, DomainError> {
        match config.store_type {
            StoreType::InMemory => Ok(Arc::new(InMemoryConnector::new())),
            StoreType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for Redis store type")
                })?;

                let mut redis_config = RedisStoreConfig::new(url);

                if let Some(prefix) = &config.key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                Ok(Arc::new(RedisConnector::new(redis_config)))
            }
        }
    }

    /// Creates a lazily-connecting manager for the configured backend
    pub fn connection_manager(
        &self,
        config: &StoreConfig,
    ) -> Result<Arc<ConnectionManager>, DomainError> {
        let connector = self.connector(config)?;

        Ok(Arc::new(ConnectionManager::with_timeout(
            connector,
            config.connection_timeout(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_type_from_str() {
        assert_eq!("in_memory".parse::<StoreType>().unwrap(), StoreType::InMemory);
        assert_eq!("memory".parse::<StoreType>().unwrap(), StoreType::InMemory);
        assert_eq!("REDIS".parse::<StoreType>().unwrap(), StoreType::Redis);
        assert!("invalid".parse::<StoreType>().is_err());
    }

    #[test]
    fn test_store_type_display() {
        assert_eq!(StoreType::InMemory.to_string(), "in_memory");
        assert_eq!(StoreType::Redis.to_string(), "redis");
    }

    #[test]
    fn test_store_config_redis() {
        let config = StoreConfig::redis("redis://localhost:6379").with_key_prefix("serving");

        assert_eq!(config.store_type, StoreType::Redis);
        assert_eq!(config.redis_url, Some("redis://localhost:6379".to_string()));
        assert_eq!(config.key_prefix, Some("serving".to_string()));
        assert_eq!(config.connection_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_redis_requires_url() {
        let config = StoreConfig {
            store_type: StoreType::Redis,
            ..Default::default()
        };

        assert!(StoreFactory::new().connector(&config).is_err());
    }

    #[test]
    fn test_redis_connector_target_is_redacted() {
        let config = StoreConfig::redis("redis://:hunter2@cache:6379");
        let connector = StoreFactory::new().connector(&config).unwrap();

        assert!(!connector.target().contains("hunter2"));
    }

    #[tokio::test]
    async fn test_in_memory_manager_connects() {
        let manager = StoreFactory::new()
            .connection_manager(&StoreConfig::in_memory())
            .unwrap();

        let store = manager.ensure_connected().await.unwrap();
        store.ping().await.unwrap();
        assert!(manager.is_connected());
    }
}
