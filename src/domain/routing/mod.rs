//! Routing domain - ordered provider selection rules

mod rules;

pub use rules::{ProviderRule, ProviderRules, RuleContext, RuleMatch};
