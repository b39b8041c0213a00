//! In-process key-value store
//!
//! Implements the Redis subset the serving core uses, for development
//! without a Redis server and for tests. Expiry is applied lazily on access.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;

use super::connection::StoreConnector;
use crate::domain::{DomainError, KeyValueStore};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Thread-safe in-memory store with Redis-like semantics
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<BTreeMap<String, Slot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Slot>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        entries.retain(|_, slot| !slot.is_expired(now));
        entries
    }

    /// Remaining TTL of a key, if it has one
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.lock();
        let now = Instant::now();

        entries
            .get(key)
            .and_then(|slot| slot.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn wrong_type(key: &str) -> DomainError {
        DomainError::store(format!(
            "WRONGTYPE Operation against key '{}' holding the wrong kind of value",
            key
        ))
    }
}

/// Converts a Redis glob (`*`, `?`, `\` escapes) into an anchored regex
fn glob_to_regex(pattern: &str) -> Result<Regex, DomainError> {
    let mut translated = String::with_capacity(pattern.len() + 2);
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            '\\' => {
                if let Some(literal) = chars.next() {
                    translated.push_str(&regex::escape(literal.encode_utf8(&mut [0; 4])));
                }
            }
            other => translated.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    Regex::new(&format!("^{}$", translated))
        .map_err(|e| DomainError::store(format!("Invalid pattern '{}': {}", pattern, e)))
}

/// Resolves Redis-style inclusive list bounds to a half-open range
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len {
        return None;
    }

    Some((start as usize, stop as usize + 1))
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.lock().get(key).map(|slot| &slot.value) {
            Some(Value::Text(text)) => Ok(Some(text.clone())),
            Some(Value::List(_)) => Err(Self::wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        self.lock().insert(
            key.to_string(),
            Slot {
                value: Value::Text(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.lock().remove(key).is_some())
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let regex = glob_to_regex(pattern)?;

        Ok(self
            .lock()
            .keys()
            .filter(|key| regex.is_match(key))
            .cloned()
            .collect())
    }

    async fn rpush(&self, key: &str, values: &[String]) -> Result<usize, DomainError> {
        let mut entries = self.lock();
        let slot = entries.entry(key.to_string()).or_insert_with(|| Slot {
            value: Value::List(VecDeque::new()),
            expires_at: None,
        });

        match &mut slot.value {
            Value::List(list) => {
                list.extend(values.iter().cloned());
                Ok(list.len())
            }
            Value::Text(_) => Err(Self::wrong_type(key)),
        }
    }

    async fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, DomainError> {
        match self.lock().get(key).map(|slot| &slot.value) {
            Some(Value::List(list)) => Ok(resolve_range(list.len(), start, stop)
                .map(|(from, to)| list.range(from..to).cloned().collect())
                .unwrap_or_default()),
            Some(Value::Text(_)) => Err(Self::wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), DomainError> {
        let mut entries = self.lock();

        let emptied = match entries.get_mut(key).map(|slot| &mut slot.value) {
            Some(Value::List(list)) => match resolve_range(list.len(), start, stop) {
                Some((from, to)) => {
                    list.truncate(to);
                    list.drain(..from);
                    list.is_empty()
                }
                None => true,
            },
            Some(Value::Text(_)) => return Err(Self::wrong_type(key)),
            None => false,
        };

        if emptied {
            entries.remove(key);
        }

        Ok(())
    }

    async fn llen(&self, key: &str) -> Result<usize, DomainError> {
        match self.lock().get(key).map(|slot| &slot.value) {
            Some(Value::List(list)) => Ok(list.len()),
            Some(Value::Text(_)) => Err(Self::wrong_type(key)),
            None => Ok(0),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        match self.lock().get_mut(key) {
            Some(slot) => {
                slot.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Connector handing out one shared in-memory store
///
/// Reconnecting returns the same store, so data survives a disconnect.
#[derive(Debug, Default)]
pub struct InMemoryConnector {
    store: Arc<InMemoryStore>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StoreConnector for InMemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        Ok(self.store.clone())
    }

    fn target(&self) -> String {
        "memory://local".to_string()
    }
}
