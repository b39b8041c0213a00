//! Model domain - classifications, registry contract and model handles

mod classification;
mod handle;
mod registry;

pub use classification::{Classification, SubscriptionTier, Tier};
pub use handle::{HandleKey, ModelHandle, Provider};
pub use registry::{ModelRegistry, ModelRegistryEntry, ModelSelection};

#[cfg(test)]
pub use registry::MockModelRegistry;
