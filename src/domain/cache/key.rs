//! Cache key derivation
//!
//! Keys are indexes, not identities: the direct-cache hash is a 32-bit
//! rolling polynomial, so unrelated queries may collide. Entries carry the
//! original query and namespace in their metadata for that reason.

use std::fmt::Debug;

/// Prefix for exact-match cache keys
pub const DIRECT_PREFIX: &str = "cache:direct";

/// Prefix for semantic cache keys
pub const SEMANTIC_PREFIX: &str = "cache:semantic";

/// Prefix for per-session history logs
pub const HISTORY_PREFIX: &str = "history";

/// Trait for deriving deterministic cache keys from a query
pub trait CacheKeyGenerator: Send + Sync + Debug {
    /// Generates the store key for a query within a namespace
    fn generate(&self, query: &str, namespace: &str) -> String;
}

/// Default direct-cache key generator
///
/// Normalizes the query (trim + lowercase), hashes `"<namespace>:<query>"`
/// and formats the result as `cache:direct:<hash>`.
#[derive(Debug, Clone, Default)]
pub struct DirectKeyGenerator;

impl DirectKeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CacheKeyGenerator for DirectKeyGenerator {
    fn generate(&self, query: &str, namespace: &str) -> String {
        let scoped = format!("{}:{}", namespace, normalize_query(query));
        format!("{}:{}", DIRECT_PREFIX, rolling_hash(&scoped).unsigned_abs())
    }
}

/// Normalizes a query for key derivation
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// 32-bit rolling polynomial hash (`h = h * 31 + unit`) over UTF-16 code units
pub fn rolling_hash(input: &str) -> i32 {
    input.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32)
    })
}

/// Key for one semantic entry
pub fn semantic_key(namespace: &str, timestamp: i64) -> String {
    format!("{}:{}:{}", SEMANTIC_PREFIX, namespace, timestamp)
}

/// Pattern enumerating the semantic entries of a namespace
///
/// Glob metacharacters in the namespace are escaped. The pattern still
/// matches keys of nested namespaces (`math` matches `math:algebra:<ts>`),
/// so scans must filter with [`is_semantic_key_of`].
pub fn semantic_pattern(namespace: &str) -> String {
    format!("{}:{}:*", SEMANTIC_PREFIX, escape_glob(namespace))
}

/// Extracts the insertion timestamp from a semantic key
pub fn semantic_key_timestamp(key: &str) -> Option<i64> {
    key.rsplit(':').next().and_then(|ts| ts.parse().ok())
}

/// Whether `key` is a semantic entry of exactly `namespace`
pub fn is_semantic_key_of(key: &str, namespace: &str) -> bool {
    semantic_key_timestamp(key).is_some_and(|ts| key == semantic_key(namespace, ts))
}

/// Escapes Redis glob metacharacters
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());

    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Key holding a session's message log
pub fn history_key(session_id: &str) -> String {
    format!("{}:{}", HISTORY_PREFIX, session_id)
}
