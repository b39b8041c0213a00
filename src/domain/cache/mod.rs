//! Cache domain - keys, entries and the backing store abstraction

mod entry;
mod key;
mod store;

pub use entry::{CacheEntry, EntryMetadata, SemanticCacheEntry, SemanticHit};
pub use key::{
    CacheKeyGenerator, DirectKeyGenerator, history_key, is_semantic_key_of,
    normalize_query, rolling_hash, semantic_key, semantic_key_timestamp, semantic_pattern,
};
pub use store::KeyValueStore;

#[cfg(test)]
pub use store::mock::FailingStore;
