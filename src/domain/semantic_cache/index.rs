//! Semantic index trait

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;
use crate::domain::cache::{SemanticCacheEntry, SemanticHit};

/// Nearest-neighbour lookup over semantic cache entries of a namespace
///
/// Implementations must honour the best-match contract of [`BestMatch`]:
/// inclusive threshold, strictly-greater replacement, oldest entry first.
///
/// [`BestMatch`]: super::BestMatch
#[async_trait]
pub trait SemanticIndex: Send + Sync + Debug {
    /// Finds the best entry scoring at least `threshold` against `embedding`
    async fn nearest(
        &self,
        namespace: &str,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<SemanticHit>, DomainError>;

    /// Inserts an entry, returning the key it was stored under
    async fn insert(
        &self,
        namespace: &str,
        entry: &SemanticCacheEntry,
    ) -> Result<String, DomainError>;

    /// Removes every entry of a namespace
    async fn remove_namespace(&self, namespace: &str) -> Result<usize, DomainError>;
}
