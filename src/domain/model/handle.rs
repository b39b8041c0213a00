//! Model handles - ready-to-invoke bindings shared across requests

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ModelRegistryEntry, ModelSelection, Tier};
use crate::domain::DomainError;

/// Provider family serving a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Anthropic,
    Meta,
    Amazon,
    Mistral,
    DeepSeek,
    OpenAi,
    Cohere,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Meta => "meta",
            Self::Amazon => "amazon",
            Self::Mistral => "mistral",
            Self::DeepSeek => "deep_seek",
            Self::OpenAi => "open_ai",
            Self::Cohere => "cohere",
        }
    }

    /// Infers the vendor from fragments of a model identifier
    pub fn from_model_id(model_id: &str) -> Option<Self> {
        const FRAGMENTS: &[(&str, Provider)] = &[
            ("anthropic", Provider::Anthropic),
            ("claude", Provider::Anthropic),
            ("meta", Provider::Meta),
            ("llama", Provider::Meta),
            ("amazon", Provider::Amazon),
            ("nova", Provider::Amazon),
            ("titan", Provider::Amazon),
            ("mistral", Provider::Mistral),
            ("mixtral", Provider::Mistral),
            ("deepseek", Provider::DeepSeek),
            ("openai", Provider::OpenAi),
            ("gpt", Provider::OpenAi),
            ("cohere", Provider::Cohere),
            ("command", Provider::Cohere),
        ];

        let model_id = model_id.to_lowercase();

        FRAGMENTS
            .iter()
            .find(|(fragment, _)| model_id.contains(fragment))
            .map(|(_, provider)| *provider)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "meta" => Ok(Self::Meta),
            "amazon" => Ok(Self::Amazon),
            "mistral" => Ok(Self::Mistral),
            "deepseek" | "deep_seek" => Ok(Self::DeepSeek),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "cohere" => Ok(Self::Cohere),
            other => Err(DomainError::configuration(format!(
                "Unknown provider: {}",
                other
            ))),
        }
    }
}

/// Identity of a cached handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandleKey {
    pub model_id: String,
    pub provider: Provider,
    pub tier: Tier,
}

impl HandleKey {
    pub fn new(model_id: impl Into<String>, provider: Provider, tier: Tier) -> Self {
        Self {
            model_id: model_id.into(),
            provider,
            tier,
        }
    }
}

impl fmt::Display for HandleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.tier, self.provider, self.model_id)
    }
}

/// A constructed binding to one (model, provider, tier) triple
///
/// Never mutated after construction, so one instance is shared by every
/// request routed to the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelHandle {
    key: HandleKey,
    invoke_id: String,
    inference_profile_id: Option<String>,
    region: String,
    temperature: f32,
    max_tokens: u32,
}

impl ModelHandle {
    pub fn new(key: HandleKey, entry: &ModelRegistryEntry, selection: &ModelSelection) -> Self {
        Self {
            key,
            invoke_id: entry.invoke_id.clone(),
            inference_profile_id: entry.inference_profile_id.clone(),
            region: entry.region.clone(),
            temperature: selection.temperature,
            max_tokens: selection.max_tokens,
        }
    }

    pub fn key(&self) -> &HandleKey {
        &self.key
    }

    pub fn model_id(&self) -> &str {
        &self.key.model_id
    }

    pub fn provider(&self) -> Provider {
        self.key.provider
    }

    pub fn tier(&self) -> Tier {
        self.key.tier
    }

    /// Identifier to invoke: the inference profile when present, else the model
    pub fn target_id(&self) -> &str {
        self.inference_profile_id
            .as_deref()
            .unwrap_or(&self.invoke_id)
    }

    pub fn invoke_id(&self) -> &str {
        &self.invoke_id
    }

    pub fn inference_profile_id(&self) -> Option<&str> {
        self.inference_profile_id.as_deref()
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
