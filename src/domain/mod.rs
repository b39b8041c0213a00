//! Domain layer - Core serving logic and entities

pub mod cache;
pub mod embedding;
pub mod error;
pub mod history;
pub mod llm;
pub mod model;
pub mod routing;
pub mod semantic_cache;

pub use cache::{CacheEntry, CacheKeyGenerator, DirectKeyGenerator, KeyValueStore, SemanticHit};
pub use embedding::EmbeddingProvider;
pub use error::DomainError;
pub use history::{MessageRole, SessionMessage};
pub use llm::ModelInvoker;
pub use model::{
    Classification, HandleKey, ModelHandle, ModelRegistry, ModelRegistryEntry, ModelSelection,
    Provider, SubscriptionTier, Tier,
};
pub use routing::{ProviderRule, ProviderRules, RuleContext};
pub use semantic_cache::{SemanticCacheConfig, SemanticIndex, cosine_similarity};
