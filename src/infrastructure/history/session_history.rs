//! Bounded per-session conversation log

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::cache::history_key;
use crate::domain::{DomainError, SessionMessage};
use crate::infrastructure::store::ConnectionManager;

/// Configuration for session history
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of messages retained per session
    #[serde(default = "default_max_stored_messages")]
    pub max_stored_messages: usize,
    /// Messages returned by a load without an explicit limit
    #[serde(default = "default_load_limit")]
    pub default_limit: usize,
    /// Expiry refreshed on every append, in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_max_stored_messages() -> usize {
    5
}

fn default_load_limit() -> usize {
    5
}

fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_stored_messages: default_max_stored_messages(),
            default_limit: default_load_limit(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl HistoryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn with_max_stored_messages(mut self, max: usize) -> Self {
        self.max_stored_messages = max;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }
}

/// Append-only, auto-trimmed message log per session
///
/// Append pushes, trims and refreshes the expiry as separate store calls.
/// A failure part-way leaves at most some over-retention until the next
/// append. Every operation absorbs and logs store failures.
#[derive(Debug)]
pub struct SessionHistory {
    connection: Arc<ConnectionManager>,
    config: HistoryConfig,
}

impl SessionHistory {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self::with_config(connection, HistoryConfig::default())
    }

    pub fn with_config(connection: Arc<ConnectionManager>, config: HistoryConfig) -> Self {
        Self { connection, config }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Records one user/assistant exchange
    pub async fn append(&self, session_id: &str, user_text: &str, assistant_text: &str) {
        let timestamp = chrono::Utc::now().timestamp_millis();

        if let Err(e) = self
            .try_append(session_id, user_text, assistant_text, timestamp)
            .await
        {
            warn!(session_id, error = %e, "Failed to append session history");
        }
    }

    async fn try_append(
        &self,
        session_id: &str,
        user_text: &str,
        assistant_text: &str,
        timestamp: i64,
    ) -> Result<(), DomainError> {
        let key = history_key(session_id);
        let payloads = SessionMessage::exchange(user_text, assistant_text, timestamp)
            .iter()
            .map(SessionMessage::to_json)
            .collect::<Result<Vec<_>, _>>()?;

        let store = self.connection.ensure_connected().await?;
        let length = store.rpush(&key, &payloads).await?;

        let max = self.config.max_stored_messages.max(1) as isize;
        store.ltrim(&key, -max, -1).await?;
        store.expire(&key, self.config.ttl()).await?;

        debug!(
            session_id,
            length = length.min(max as usize),
            "Session history appended"
        );

        Ok(())
    }

    /// The newest `limit` messages, oldest first
    ///
    /// Entries that fail to parse are skipped.
    pub async fn load(&self, session_id: &str, limit: usize) -> Vec<SessionMessage> {
        if limit == 0 {
            return Vec::new();
        }

        match self.try_load(session_id, limit).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(session_id, error = %e, "Failed to load session history");
                Vec::new()
            }
        }
    }

    /// Loads with the configured default limit
    pub async fn load_recent(&self, session_id: &str) -> Vec<SessionMessage> {
        self.load(session_id, self.config.default_limit).await
    }

    async fn try_load(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionMessage>, DomainError> {
        let key = history_key(session_id);
        let store = self.connection.ensure_connected().await?;
        // Limits past isize::MAX mean "everything"
        let start = isize::try_from(limit).map_or(-isize::MAX, |limit| -limit);
        let raw = store.lrange(&key, start, -1).await?;

        Ok(raw
            .iter()
            .filter_map(|entry| match SessionMessage::from_json(entry) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!(session_id, error = %e, "Skipping unreadable history entry");
                    None
                }
            })
            .collect())
    }

    /// Deletes a session's log
    pub async fn clear(&self, session_id: &str) {
        let key = history_key(session_id);

        let result = match self.connection.ensure_connected().await {
            Ok(store) => store.delete(&key).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(existed) => debug!(session_id, existed, "Session history cleared"),
            Err(e) => warn!(session_id, error = %e, "Failed to clear session history"),
        }
    }

    /// Number of stored messages; 0 when the store is unavailable
    pub async fn count(&self, session_id: &str) -> usize {
        let key = history_key(session_id);

        let result = match self.connection.ensure_connected().await {
            Ok(store) => store.llen(&key).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            warn!(session_id, error = %e, "Failed to count session history");
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::FailingStore;
    use crate::domain::{KeyValueStore, MessageRole};
    use crate::infrastructure::store::{InMemoryConnector, InMemoryStore, MockConnector};

    fn history_over(store: Arc<InMemoryStore>, config: HistoryConfig) -> SessionHistory {
        let connector = Arc::new(InMemoryConnector::with_store(store));
        SessionHistory::with_config(Arc::new(ConnectionManager::new(connector)), config)
    }

    fn history() -> SessionHistory {
        history_over(Arc::new(InMemoryStore::new()), HistoryConfig::default())
    }

    #[tokio::test]
    async fn test_append_and_load() {
        let history = history();

        history.append("s1", "hello", "hi there").await;

        let messages = history.load("s1", 5).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "hi there");
        assert_eq!(messages[1].timestamp, messages[0].timestamp + 1);
    }

    #[tokio::test]
    async fn test_history_never_exceeds_bound() {
        let history = history();

        for turn in 0..6 {
            history
                .append("s1", &format!("question {}", turn), &format!("answer {}", turn))
                .await;
            assert!(history.count("s1").await <= 5);
        }

        assert_eq!(history.count("s1").await, 5);

        let contents: Vec<_> = history
            .load("s1", 5)
            .await
            .into_iter()
            .map(|message| message.content)
            .collect();

        assert_eq!(
            contents,
            vec!["answer 3", "question 4", "answer 4", "question 5", "answer 5"]
        );
    }

    #[tokio::test]
    async fn test_load_limit_returns_newest_oldest_first() {
        let history = history_over(
            Arc::new(InMemoryStore::new()),
            HistoryConfig::default().with_max_stored_messages(10),
        );

        history.append("s1", "q1", "a1").await;
        history.append("s1", "q2", "a2").await;

        let contents: Vec<_> = history
            .load("s1", 3)
            .await
            .into_iter()
            .map(|message| message.content)
            .collect();

        assert_eq!(contents, vec!["a1", "q2", "a2"]);
        assert!(history.load("s1", 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_limit_loads_everything() {
        let history = history();

        history.append("s1", "q", "a").await;

        for limit in [usize::MAX, usize::MAX / 2 + 1, isize::MAX as usize] {
            let contents: Vec<_> = history
                .load("s1", limit)
                .await
                .into_iter()
                .map(|message| message.content)
                .collect();

            assert_eq!(contents, vec!["q", "a"], "limit {}", limit);
        }
    }

    #[tokio::test]
    async fn test_load_does_not_mutate() {
        let history = history();

        history.append("s1", "q", "a").await;
        history.load("s1", 1).await;

        assert_eq!(history.count("s1").await, 2);
    }

    #[tokio::test]
    async fn test_append_refreshes_ttl() {
        let store = Arc::new(InMemoryStore::new());
        let history = history_over(
            store.clone(),
            HistoryConfig::default().with_ttl(Duration::from_secs(120)),
        );

        history.append("s1", "q", "a").await;

        let ttl = store.ttl("history:s1").unwrap();
        assert!(ttl <= Duration::from_secs(120));
        assert!(ttl > Duration::from_secs(100));
    }

    #[tokio::test]
    async fn test_unreadable_entries_are_skipped() {
        let store = Arc::new(InMemoryStore::new());
        let history = history_over(store.clone(), HistoryConfig::default());

        store
            .rpush("history:s1", &["{broken".to_string()])
            .await
            .unwrap();
        history.append("s1", "q", "a").await;

        let messages = history.load("s1", 5).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "q");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let history = history();

        history.append("s1", "q", "a").await;

        assert_eq!(history.count("s2").await, 0);
        assert!(history.load("s2", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let history = history();

        history.append("s1", "q", "a").await;
        history.clear("s1").await;

        assert_eq!(history.count("s1").await, 0);
        history.clear("s1").await;
    }

    #[tokio::test]
    async fn test_store_failures_degrade() {
        let connector = MockConnector::new().with_store(Arc::new(FailingStore::new("down")));
        let history = SessionHistory::new(Arc::new(ConnectionManager::new(Arc::new(connector))));

        history.append("s1", "q", "a").await;
        history.clear("s1").await;

        assert!(history.load_recent("s1").await.is_empty());
        assert_eq!(history.count("s1").await, 0);
    }
}
