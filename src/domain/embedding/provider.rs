//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Trait for embedding providers
///
/// Stored and probing embeddings must come from the same model and version,
/// otherwise similarity scores are meaningless.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Identifier of the embedding model (and version)
    fn model(&self) -> &str;

    /// Output dimensionality, if known
    fn dimensions(&self) -> Option<usize>;
}
