//! Query classification and subscription tiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Classification of an inbound query, produced upstream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    /// Subject area, e.g. "math"
    pub subject: String,
    /// Difficulty level, e.g. "basic", "intermediate", "advanced"
    pub level: String,
}

impl Classification {
    pub fn new(subject: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            level: level.into(),
        }
    }
}

impl Default for Classification {
    /// The classification routing falls back to when resolution fails
    fn default() -> Self {
        Self::new("general", "basic")
    }
}

/// Quality/cost level governing model choice and generation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Intermediate,
    Advanced,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Maps a classification level onto a tier
    pub fn from_level(level: &str) -> Result<Self, DomainError> {
        level.parse()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "beginner" | "elementary" => Ok(Self::Basic),
            "intermediate" | "medium" => Ok(Self::Intermediate),
            "advanced" | "expert" => Ok(Self::Advanced),
            other => Err(DomainError::config_resolution(format!(
                "Unknown level: {}. Valid levels: basic, intermediate, advanced",
                other
            ))),
        }
    }
}

/// Subscription plan of the requesting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Standard,
    Premium,
    Enterprise,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Premium => "premium",
            Self::Enterprise => "enterprise",
        }
    }

    /// Highest tier this plan may use
    pub fn max_tier(&self) -> Tier {
        match self {
            Self::Free => Tier::Basic,
            Self::Standard => Tier::Intermediate,
            Self::Premium | Self::Enterprise => Tier::Advanced,
        }
    }

    /// Caps a requested tier to what the plan allows
    pub fn cap(&self, requested: Tier) -> Tier {
        requested.min(self.max_tier())
    }

    pub fn is_paid_top_plan(&self) -> bool {
        matches!(self, Self::Premium | Self::Enterprise)
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "standard" | "basic" => Ok(Self::Standard),
            "premium" | "pro" => Ok(Self::Premium),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(DomainError::configuration(format!(
                "Unknown subscription: {}. Valid subscriptions: free, standard, premium, enterprise",
                other
            ))),
        }
    }
}
