//! Semantic cache domain models and traits
//!
//! Matches queries by embedding similarity rather than by exact key.

mod config;
mod index;
mod matcher;
mod similarity;

pub use config::SemanticCacheConfig;
pub use index::SemanticIndex;
pub use matcher::BestMatch;
pub use similarity::{checked_cosine_similarity, cosine_similarity};
