//! Key-value store trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Backing key-value store used by the cache layers and session history
///
/// Mirrors the subset of Redis the serving core relies on: string values
/// with expiry, ordered lists, and glob-style key enumeration. List
/// indexes follow Redis semantics (negative indexes count from the tail,
/// `stop` is inclusive).
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Gets a string value
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a string value with a TTL
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a key of any type
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Enumerates keys matching a glob pattern (`*` wildcard)
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, DomainError>;

    /// Appends values to the tail of a list, returning the new length
    async fn rpush(&self, key: &str, values: &[String]) -> Result<usize, DomainError>;

    /// Reads an inclusive range of a list
    async fn lrange(&self, key: &str, start: isize, stop: isize)
        -> Result<Vec<String>, DomainError>;

    /// Trims a list to an inclusive range
    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), DomainError>;

    /// Returns the length of a list (0 when missing)
    async fn llen(&self, key: &str) -> Result<usize, DomainError>;

    /// Updates the TTL of an existing key
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError>;

    /// Round-trips to the store
    async fn ping(&self) -> Result<(), DomainError>;
}
