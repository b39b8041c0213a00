//! Model router
//!
//! Picks the model, provider and tier for a request and hands out a shared
//! handle for that combination. Routing is total: resolution failures fall
//! back to the default classification, then to an emergency handle.

use std::sync::Arc;

use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::domain::{
    Classification, DomainError, HandleKey, ModelHandle, ModelRegistry, ModelRegistryEntry,
    ModelSelection, ProviderRules, RuleContext, SubscriptionTier, Tier,
};
use crate::infrastructure::observability::record_router_selection;

/// Router configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Model used when the registry has no deployment entry
    #[serde(default = "default_fallback_model_id")]
    pub fallback_model_id: String,
    /// Region of the fallback model
    #[serde(default = "default_fallback_region")]
    pub fallback_region: String,
    /// Temperature of the emergency handle
    #[serde(default = "default_emergency_temperature")]
    pub emergency_temperature: f32,
    /// Token budget of the emergency handle
    #[serde(default = "default_emergency_max_tokens")]
    pub emergency_max_tokens: u32,
    /// Maximum number of cached handles
    #[serde(default = "default_handle_cache_capacity")]
    pub handle_cache_capacity: u64,
}

fn default_fallback_model_id() -> String {
    "anthropic.claude-3-haiku-20240307-v1:0".to_string()
}

fn default_fallback_region() -> String {
    "us-east-1".to_string()
}

fn default_emergency_temperature() -> f32 {
    0.7
}

fn default_emergency_max_tokens() -> u32 {
    1024
}

fn default_handle_cache_capacity() -> u64 {
    256
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            fallback_model_id: default_fallback_model_id(),
            fallback_region: default_fallback_region(),
            emergency_temperature: default_emergency_temperature(),
            emergency_max_tokens: default_emergency_max_tokens(),
            handle_cache_capacity: default_handle_cache_capacity(),
        }
    }
}

impl RouterConfig {
    fn fallback_entry(&self) -> ModelRegistryEntry {
        ModelRegistryEntry::new(
            self.fallback_model_id.clone(),
            self.fallback_model_id.clone(),
            self.fallback_region.clone(),
        )
    }
}

/// Routes requests to shared model handles
#[derive(Debug)]
pub struct ModelRouter {
    registry: Arc<dyn ModelRegistry>,
    rules: ProviderRules,
    handles: Cache<HandleKey, Arc<ModelHandle>>,
    config: RouterConfig,
}

impl ModelRouter {
    pub fn new(registry: Arc<dyn ModelRegistry>) -> Self {
        Self::with_config(registry, RouterConfig::default())
    }

    pub fn with_config(registry: Arc<dyn ModelRegistry>, config: RouterConfig) -> Self {
        Self {
            registry,
            rules: ProviderRules::default(),
            handles: Cache::builder()
                .max_capacity(config.handle_cache_capacity)
                .build(),
            config,
        }
    }

    /// Replaces the provider rules
    pub fn with_rules(mut self, rules: ProviderRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Returns the handle for a request; never fails
    pub async fn select(
        &self,
        classification: &Classification,
        subscription: SubscriptionTier,
        query: &str,
    ) -> Arc<ModelHandle> {
        match self.resolve(classification, subscription, query).await {
            Ok(handle) => {
                record_router_selection(handle.provider().as_str(), false);
                return handle;
            }
            Err(e) => warn!(
                subject = %classification.subject,
                level = %classification.level,
                error = %e,
                "Routing failed, retrying with default classification"
            ),
        }

        match self
            .resolve(&Classification::default(), subscription, query)
            .await
        {
            Ok(handle) => {
                record_router_selection(handle.provider().as_str(), true);
                handle
            }
            Err(e) => {
                error!(error = %e, "Default routing failed, using emergency handle");
                let handle = self.emergency_handle();
                record_router_selection(handle.provider().as_str(), true);
                handle
            }
        }
    }

    async fn resolve(
        &self,
        classification: &Classification,
        subscription: SubscriptionTier,
        query: &str,
    ) -> Result<Arc<ModelHandle>, DomainError> {
        let selection = self.registry.resolve_config(classification, subscription)?;

        let (model_id, entry) = match self.registry.resolve_entry(&selection.model_id) {
            Some(entry) => (selection.model_id.clone(), entry),
            None => {
                warn!(
                    model_id = %selection.model_id,
                    fallback = %self.config.fallback_model_id,
                    "No registry entry for model, using fallback model"
                );
                (self.config.fallback_model_id.clone(), self.config.fallback_entry())
            }
        };

        let context = RuleContext::new(query, classification, subscription, &model_id);
        let (provider, rule) = self.rules.select(&context);
        let key = HandleKey::new(model_id, provider, selection.tier);

        debug!(handle = %key, rule, "Model route selected");

        let handle = self
            .handles
            .get_with(key.clone(), async {
                debug!(handle = %key, "Constructing model handle");
                Arc::new(ModelHandle::new(key, &entry, &selection))
            })
            .await;

        Ok(handle)
    }

    /// Hardcoded handle used when even default routing fails
    fn emergency_handle(&self) -> Arc<ModelHandle> {
        let selection = ModelSelection::new(
            self.config.fallback_model_id.clone(),
            self.config.emergency_temperature,
            self.config.emergency_max_tokens,
            Tier::Basic,
        );
        let key = HandleKey::new(
            self.config.fallback_model_id.clone(),
            self.rules.fallback(),
            Tier::Basic,
        );

        Arc::new(ModelHandle::new(key, &self.config.fallback_entry(), &selection))
    }

    /// Number of cached handles
    pub async fn cached_handles(&self) -> u64 {
        self.handles.run_pending_tasks().await;
        self.handles.entry_count()
    }

    /// Drops every cached handle
    pub async fn clear_cache(&self) {
        self.handles.invalidate_all();
        self.handles.run_pending_tasks().await;
    }
}
