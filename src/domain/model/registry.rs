//! Model registry contract

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::{Classification, SubscriptionTier, Tier};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Deployment metadata of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRegistryEntry {
    pub canonical_id: String,
    pub invoke_id: String,
    #[serde(default)]
    pub inference_profile_id: Option<String>,
    pub region: String,
}

impl ModelRegistryEntry {
    pub fn new(
        canonical_id: impl Into<String>,
        invoke_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            canonical_id: canonical_id.into(),
            invoke_id: invoke_id.into(),
            inference_profile_id: None,
            region: region.into(),
        }
    }

    pub fn with_inference_profile(mut self, profile_id: impl Into<String>) -> Self {
        self.inference_profile_id = Some(profile_id.into());
        self
    }
}

/// Model and generation parameters chosen for a request
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub tier: Tier,
}

impl ModelSelection {
    pub fn new(model_id: impl Into<String>, temperature: f32, max_tokens: u32, tier: Tier) -> Self {
        Self {
            model_id: model_id.into(),
            temperature,
            max_tokens,
            tier,
        }
    }
}

/// Source of model configuration and deployment metadata
#[cfg_attr(test, automock)]
pub trait ModelRegistry: Send + Sync + Debug {
    /// Resolves the model and parameters for a classification and plan
    fn resolve_config(
        &self,
        classification: &Classification,
        subscription: SubscriptionTier,
    ) -> Result<ModelSelection, DomainError>;

    /// Looks up deployment metadata by model identifier
    fn resolve_entry(&self, model_id: &str) -> Option<ModelRegistryEntry>;
}
