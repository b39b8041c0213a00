//! File-backed model registry
//!
//! Loads model deployments and tier selections from TOML:
//!
//! ```toml
//! [[models]]
//! canonical_id = "claude-3-5-sonnet"
//! invoke_id = "anthropic.claude-3-5-sonnet-20240620-v1:0"
//! region = "us-east-1"
//!
//! [tiers.advanced]
//! model_id = "claude-3-5-sonnet"
//! temperature = 0.3
//! max_tokens = 4096
//!
//! [[overrides]]
//! subject = "coding"
//! tier = "intermediate"
//! model_id = "mistral-large"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    Classification, DomainError, ModelRegistry, ModelRegistryEntry, ModelSelection,
    SubscriptionTier, Tier,
};

/// Error type for registry files
#[derive(Debug, Error)]
pub enum RegistryConfigError {
    #[error("Failed to read registry file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid registry: {0}")]
    ValidationError(String),
}

impl From<RegistryConfigError> for DomainError {
    fn from(error: RegistryConfigError) -> Self {
        DomainError::configuration(error.to_string())
    }
}

/// Generation parameters of one tier
#[derive(Debug, Clone, Deserialize)]
pub struct TierSelection {
    pub model_id: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

/// Per-tier selections; a missing tier fails resolution
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TierSelections {
    pub basic: Option<TierSelection>,
    pub intermediate: Option<TierSelection>,
    pub advanced: Option<TierSelection>,
}

impl TierSelections {
    pub fn get(&self, tier: Tier) -> Option<&TierSelection> {
        match tier {
            Tier::Basic => self.basic.as_ref(),
            Tier::Intermediate => self.intermediate.as_ref(),
            Tier::Advanced => self.advanced.as_ref(),
        }
    }

    fn iter(&self) -> impl Iterator<Item = (Tier, &TierSelection)> {
        [Tier::Basic, Tier::Intermediate, Tier::Advanced]
            .into_iter()
            .filter_map(|tier| self.get(tier).map(|selection| (tier, selection)))
    }
}

/// Subject-specific replacement of a tier selection
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionOverride {
    pub subject: String,
    /// Tier the override applies to (after the subscription cap); any when absent
    #[serde(default)]
    pub tier: Option<Tier>,
    pub model_id: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl SelectionOverride {
    fn applies_to(&self, subject: &str, tier: Tier) -> bool {
        self.subject.eq_ignore_ascii_case(subject) && self.tier.is_none_or(|t| t == tier)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    models: Vec<ModelRegistryEntry>,
    #[serde(default)]
    tiers: TierSelections,
    #[serde(default)]
    overrides: Vec<SelectionOverride>,
}

/// Model registry loaded once from a TOML document
#[derive(Debug, Clone)]
pub struct StaticModelRegistry {
    models: Vec<ModelRegistryEntry>,
    tiers: TierSelections,
    overrides: Vec<SelectionOverride>,
}

impl StaticModelRegistry {
    /// Loads the registry from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryConfigError> {
        let path = path.as_ref();
        debug!("Loading model registry from {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_toml(&content)?;

        info!(
            path = %path.display(),
            models = registry.models.len(),
            overrides = registry.overrides.len(),
            "Model registry loaded"
        );

        Ok(registry)
    }

    /// Parses the registry from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, RegistryConfigError> {
        let file: RegistryFile = toml::from_str(content)?;
        Self::validate(&file)?;

        Ok(Self {
            models: file.models,
            tiers: file.tiers,
            overrides: file.overrides,
        })
    }

    fn validate(file: &RegistryFile) -> Result<(), RegistryConfigError> {
        if file.tiers.iter().next().is_none() {
            return Err(RegistryConfigError::ValidationError(
                "at least one tier must be configured".to_string(),
            ));
        }

        for (tier, selection) in file.tiers.iter() {
            if selection.model_id.trim().is_empty() {
                return Err(RegistryConfigError::ValidationError(format!(
                    "tier '{}' has an empty model_id",
                    tier
                )));
            }

            if !(0.0..=2.0).contains(&selection.temperature) {
                return Err(RegistryConfigError::ValidationError(format!(
                    "tier '{}' temperature {} is outside 0.0..=2.0",
                    tier, selection.temperature
                )));
            }
        }

        for entry in &file.models {
            if entry.canonical_id.trim().is_empty() || entry.invoke_id.trim().is_empty() {
                return Err(RegistryConfigError::ValidationError(
                    "model entries need a canonical_id and an invoke_id".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn models(&self) -> &[ModelRegistryEntry] {
        &self.models
    }
}

impl ModelRegistry for StaticModelRegistry {
    fn resolve_config(
        &self,
        classification: &Classification,
        subscription: SubscriptionTier,
    ) -> Result<ModelSelection, DomainError> {
        let tier = subscription.cap(Tier::from_level(&classification.level)?);
        let subject = classification.subject.trim();

        let base = self.tiers.get(tier).ok_or_else(|| {
            DomainError::config_resolution(format!("No model configured for tier '{}'", tier))
        })?;

        let selection = match self
            .overrides
            .iter()
            .find(|candidate| candidate.applies_to(subject, tier))
        {
            Some(matched) => ModelSelection::new(
                matched.model_id.clone(),
                matched.temperature.unwrap_or(base.temperature),
                matched.max_tokens.unwrap_or(base.max_tokens),
                tier,
            ),
            None => ModelSelection::new(
                base.model_id.clone(),
                base.temperature,
                base.max_tokens,
                tier,
            ),
        };

        Ok(selection)
    }

    fn resolve_entry(&self, model_id: &str) -> Option<ModelRegistryEntry> {
        self.models
            .iter()
            .find(|entry| entry.canonical_id == model_id || entry.invoke_id == model_id)
            .cloned()
    }
}
