//! Model registry implementations

mod static_registry;

pub use static_registry::{
    RegistryConfigError, SelectionOverride, StaticModelRegistry, TierSelection, TierSelections,
};
