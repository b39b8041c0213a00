//! Query serving pipeline
//!
//! exact cache → semantic cache → router + generation → write-back,
//! with the session history appended whatever layer answered.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::cache::EntryMetadata;
use crate::domain::history::{ConversationContext, format_context};
use crate::domain::{
    Classification, DomainError, EmbeddingProvider, ModelHandle, ModelInvoker, SubscriptionTier,
};
use crate::infrastructure::cache::{ExactCache, SemanticCache};
use crate::infrastructure::history::SessionHistory;
use crate::infrastructure::observability::record_generation;
use crate::infrastructure::routing::ModelRouter;

/// One inbound query
#[derive(Debug, Clone)]
pub struct ServeRequest {
    pub query: String,
    pub classification: Classification,
    pub subscription: SubscriptionTier,
    /// Session whose history is replayed and appended
    pub session_id: Option<String>,
    /// Cache namespace; the classification subject when absent
    pub namespace: Option<String>,
}

impl ServeRequest {
    pub fn new(query: impl Into<String>, classification: Classification) -> Self {
        Self {
            query: query.into(),
            classification,
            subscription: SubscriptionTier::default(),
            session_id: None,
            namespace: None,
        }
    }

    pub fn with_subscription(mut self, subscription: SubscriptionTier) -> Self {
        self.subscription = subscription;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Namespace the request's cache entries live in
    pub fn cache_namespace(&self) -> String {
        self.namespace
            .clone()
            .unwrap_or_else(|| self.classification.subject.trim().to_lowercase())
    }
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Exact,
    Semantic,
    Generated,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Semantic => "semantic",
            Self::Generated => "generated",
        }
    }
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to a [`ServeRequest`]
#[derive(Debug, Clone)]
pub struct ServeOutcome {
    pub response: String,
    pub source: ResponseSource,
    /// Similarity of the semantic hit
    pub score: Option<f32>,
    /// Handle that generated the response
    pub handle: Option<Arc<ModelHandle>>,
}

impl ServeOutcome {
    fn cached(response: String, source: ResponseSource, score: Option<f32>) -> Self {
        Self {
            response,
            source,
            score,
            handle: None,
        }
    }
}

/// Builds the generation prompt from the replayed session and the query
pub fn build_prompt(context: &ConversationContext, query: &str) -> String {
    if context.is_empty() {
        return query.to_string();
    }

    let mut prompt = String::new();

    if let Some(name) = &context.user_name {
        prompt.push_str(&format!("The user's name is {}.\n\n", name));
    }

    prompt.push_str("Conversation so far:\n");
    prompt.push_str(&context.transcript);
    prompt.push_str("\n\nUser: ");
    prompt.push_str(query);

    prompt
}

/// Serves queries from cache or a routed model
#[derive(Debug)]
pub struct ServingService {
    exact: Arc<ExactCache>,
    semantic: Arc<SemanticCache>,
    router: Arc<ModelRouter>,
    history: Arc<SessionHistory>,
    embedder: Arc<dyn EmbeddingProvider>,
    invoker: Arc<dyn ModelInvoker>,
}

impl ServingService {
    pub fn new(
        exact: Arc<ExactCache>,
        semantic: Arc<SemanticCache>,
        router: Arc<ModelRouter>,
        history: Arc<SessionHistory>,
        embedder: Arc<dyn EmbeddingProvider>,
        invoker: Arc<dyn ModelInvoker>,
    ) -> Self {
        Self {
            exact,
            semantic,
            router,
            history,
            embedder,
            invoker,
        }
    }

    /// Answers a query
    ///
    /// Only a generation failure is returned as an error; cache, embedding
    /// and history failures degrade to misses.
    pub async fn answer(&self, request: ServeRequest) -> Result<ServeOutcome, DomainError> {
        let namespace = request.cache_namespace();

        if let Some(entry) = self.exact.lookup(&request.query, &namespace).await {
            self.remember(&request, &entry.response).await;
            return Ok(ServeOutcome::cached(entry.response, ResponseSource::Exact, None));
        }

        let embedding = self.embed(&request.query).await;

        if let Some(embedding) = &embedding {
            if let Some(hit) = self.semantic.lookup(embedding, &namespace).await {
                self.remember(&request, &hit.response).await;
                return Ok(ServeOutcome::cached(
                    hit.response,
                    ResponseSource::Semantic,
                    Some(hit.score),
                ));
            }
        }

        let context = match &request.session_id {
            Some(session_id) => format_context(&self.history.load_recent(session_id).await),
            None => ConversationContext::default(),
        };

        let handle = self
            .router
            .select(&request.classification, request.subscription, &request.query)
            .await;

        let started = Instant::now();
        let generated = self
            .invoker
            .generate(&handle, &build_prompt(&context, &request.query))
            .await;
        record_generation(handle.provider().as_str(), generated.is_ok(), started.elapsed());

        let response = generated?;

        info!(
            namespace = %namespace,
            handle = %handle.key(),
            "Generated response"
        );

        let metadata = Self::generation_metadata(&handle);
        self.exact
            .store(&request.query, &response, &namespace, metadata.clone())
            .await;

        if let Some(embedding) = embedding {
            self.semantic
                .store(&request.query, &response, embedding, &namespace, metadata)
                .await;
        }

        self.remember(&request, &response).await;

        Ok(ServeOutcome {
            response,
            source: ResponseSource::Generated,
            score: None,
            handle: Some(handle),
        })
    }

    async fn embed(&self, query: &str) -> Option<Vec<f32>> {
        if !self.semantic.config().enabled {
            return None;
        }

        match self.embedder.embed(query).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                warn!(
                    model = %self.embedder.model(),
                    error = %e,
                    "Embedding failed, skipping semantic cache"
                );
                None
            }
        }
    }

    async fn remember(&self, request: &ServeRequest, response: &str) {
        if let Some(session_id) = &request.session_id {
            self.history.append(session_id, &request.query, response).await;
        } else {
            debug!("No session, history not recorded");
        }
    }

    fn generation_metadata(handle: &ModelHandle) -> EntryMetadata {
        let mut metadata = EntryMetadata::new();
        metadata.insert("model_id".to_string(), Value::from(handle.model_id()));
        metadata.insert("provider".to_string(), Value::from(handle.provider().as_str()));
        metadata.insert("tier".to_string(), Value::from(handle.tier().as_str()));
        metadata
    }
}
