//! LLM serving core
//!
//! The decision layer in front of LLM backends:
//! - Exact and semantic response caching over a shared key-value store
//! - Tier and provider routing with cached model handles
//! - Bounded, expiring session history replayed into prompts

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
