//! Provider selection rules
//!
//! Rules are evaluated top to bottom and the first match wins. The order
//! is routing policy: reordering changes which provider answers.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::model::{Classification, Provider, SubscriptionTier, Tier};

const FORMAL_REASONING_KEYWORDS: &[&str] = &[
    "prove",
    "proof",
    "derive",
    "derivation",
    "rigorous",
    "rigor",
    "theorem",
    "lemma",
];

const RECENCY_KEYWORDS: &[&str] = &[
    "latest",
    "news",
    "today",
    "current events",
    "recent",
    "this week",
    "this year",
];

static FORMAL_REASONING: Lazy<Regex> = Lazy::new(|| keyword_pattern(FORMAL_REASONING_KEYWORDS));

static RECENCY: Lazy<Regex> = Lazy::new(|| keyword_pattern(RECENCY_KEYWORDS));

/// Whole-word, case-insensitive alternation of `keywords`
fn keyword_pattern(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|keyword| regex::escape(keyword))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
}

const STEM_SUBJECTS: &[&str] = &["math", "mathematics", "physics"];

const CODING_SUBJECTS: &[&str] = &["coding", "programming", "computer science", "computer_science"];

const HUMANITIES_SUBJECTS: &[&str] = &["literature", "language", "history"];

/// Lowercased request fields the rules are evaluated against
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub query: String,
    pub subject: String,
    pub level: String,
    /// Tier the level maps to, if it is a known level
    pub tier: Option<Tier>,
    pub subscription: SubscriptionTier,
    pub model_id: String,
}

impl RuleContext {
    pub fn new(
        query: &str,
        classification: &Classification,
        subscription: SubscriptionTier,
        model_id: &str,
    ) -> Self {
        Self {
            query: query.to_lowercase(),
            subject: classification.subject.trim().to_lowercase(),
            level: classification.level.trim().to_lowercase(),
            tier: Tier::from_level(&classification.level).ok(),
            subscription,
            model_id: model_id.to_lowercase(),
        }
    }

    fn query_mentions(&self, keywords: &Regex) -> bool {
        keywords.is_match(&self.query)
    }

    fn tier_is(&self, tier: Tier) -> bool {
        self.tier == Some(tier)
    }

    fn subject_in(&self, subjects: &[&str]) -> bool {
        subjects.contains(&self.subject.as_str())
    }
}

/// How a rule picks its provider
#[derive(Clone, Copy)]
pub enum RuleMatch {
    /// Fixed provider when the predicate holds
    Fixed(fn(&RuleContext) -> bool, Provider),
    /// Provider computed from the context, if any
    Derived(fn(&RuleContext) -> Option<Provider>),
}

/// A named provider rule
#[derive(Clone)]
pub struct ProviderRule {
    name: &'static str,
    matcher: RuleMatch,
}

impl ProviderRule {
    pub fn when(name: &'static str, predicate: fn(&RuleContext) -> bool, provider: Provider) -> Self {
        Self {
            name,
            matcher: RuleMatch::Fixed(predicate, provider),
        }
    }

    pub fn derived(name: &'static str, derive: fn(&RuleContext) -> Option<Provider>) -> Self {
        Self {
            name,
            matcher: RuleMatch::Derived(derive),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn evaluate(&self, context: &RuleContext) -> Option<Provider> {
        match self.matcher {
            RuleMatch::Fixed(predicate, provider) => predicate(context).then_some(provider),
            RuleMatch::Derived(derive) => derive(context),
        }
    }
}

impl fmt::Debug for ProviderRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRule")
            .field("name", &self.name)
            .finish()
    }
}

/// Ordered rule list with a fallback provider
#[derive(Debug, Clone)]
pub struct ProviderRules {
    rules: Vec<ProviderRule>,
    fallback: Provider,
}

impl ProviderRules {
    pub fn new(rules: Vec<ProviderRule>, fallback: Provider) -> Self {
        Self { rules, fallback }
    }

    pub fn rules(&self) -> &[ProviderRule] {
        &self.rules
    }

    pub fn fallback(&self) -> Provider {
        self.fallback
    }

    /// Returns the provider and the name of the rule that chose it
    pub fn select(&self, context: &RuleContext) -> (Provider, &'static str) {
        self.rules
            .iter()
            .find_map(|rule| rule.evaluate(context).map(|provider| (provider, rule.name())))
            .unwrap_or((self.fallback, "fallback"))
    }
}

impl Default for ProviderRules {
    fn default() -> Self {
        Self::new(
            vec![
                ProviderRule::when(
                    "formal_reasoning",
                    |ctx| ctx.query_mentions(&FORMAL_REASONING),
                    Provider::DeepSeek,
                ),
                ProviderRule::when(
                    "recency",
                    |ctx| ctx.query_mentions(&RECENCY),
                    Provider::Amazon,
                ),
                ProviderRule::when(
                    "advanced_stem",
                    |ctx| ctx.subject_in(STEM_SUBJECTS) && ctx.tier_is(Tier::Advanced),
                    Provider::Anthropic,
                ),
                ProviderRule::when(
                    "coding",
                    |ctx| ctx.subject_in(CODING_SUBJECTS),
                    Provider::Mistral,
                ),
                ProviderRule::when(
                    "basic_humanities",
                    |ctx| ctx.subject_in(HUMANITIES_SUBJECTS) && ctx.tier_is(Tier::Basic),
                    Provider::Meta,
                ),
                ProviderRule::when(
                    "top_plan",
                    |ctx| ctx.subscription.is_paid_top_plan(),
                    Provider::Anthropic,
                ),
                ProviderRule::derived("model_vendor", |ctx| Provider::from_model_id(&ctx.model_id)),
            ],
            Provider::Anthropic,
        )
    }
}
