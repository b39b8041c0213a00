//! Cache infrastructure - Exact and semantic response caches

mod exact;
mod semantic;

pub use exact::{ExactCache, ExactCacheConfig};
pub use semantic::{SemanticCache, StoreSemanticIndex};
