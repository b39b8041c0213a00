//! CLI module for the serving core
//!
//! Operational subcommands over the configured store and registry:
//! - `route`: show which model a request would be routed to
//! - `ping`: check the key-value store is reachable
//! - `history`: inspect or clear a session's history
//! - `cache`: inspect or invalidate cached responses

pub mod cache;
pub mod history;
pub mod ping;
pub mod route;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::observability::init_metrics;
use crate::infrastructure::store::{ConnectionManager, StoreFactory, StoreType};

/// Serving core - response caching, model routing and session history
#[derive(Parser)]
#[command(name = "llm-serving-core")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve the model handle for a classified request
    Route(route::RouteArgs),

    /// Check connectivity to the configured store
    Ping,

    /// Inspect or clear session history
    #[command(subcommand)]
    History(history::HistoryCommand),

    /// Inspect or invalidate cached responses
    #[command(subcommand)]
    Cache(cache::CacheCommand),
}

/// Loads configuration and installs logging and metrics
pub fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration, using defaults: {}", e);
            AppConfig::default()
        }
    };

    logging::init_logging(&config.logging);

    if init_metrics(&config.metrics) {
        debug!(addr = %config.metrics.listen_addr, "Metrics exporter started");
    }

    config
}

pub(crate) fn connection_manager(config: &AppConfig) -> anyhow::Result<Arc<ConnectionManager>> {
    let manager = StoreFactory::new().connection_manager(&config.store)?;

    if config.store.store_type == StoreType::InMemory {
        warn!("Using in-memory store; state does not outlive this process");
    }

    Ok(manager)
}

/// Runs the parsed command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = bootstrap();

    match cli.command {
        Command::Route(args) => route::run(&config, args).await,
        Command::Ping => ping::run(&config).await,
        Command::History(command) => history::run(&config, command).await,
        Command::Cache(command) => cache::run(&config, command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SubscriptionTier;

    #[test]
    fn test_parse_route() {
        let cli = Cli::try_parse_from([
            "llm-serving-core",
            "route",
            "--subject",
            "math",
            "--level",
            "advanced",
            "--subscription",
            "premium",
            "prove the lemma",
        ])
        .unwrap();

        match cli.command {
            Command::Route(args) => {
                assert_eq!(args.subject, "math");
                assert_eq!(args.level, "advanced");
                assert_eq!(args.subscription, SubscriptionTier::Premium);
                assert_eq!(args.query, "prove the lemma");
            }
            _ => panic!("Expected route command"),
        }
    }

    #[test]
    fn test_parse_route_defaults_to_free() {
        let cli =
            Cli::try_parse_from(["llm-serving-core", "route", "--subject", "history", "why"])
                .unwrap();

        match cli.command {
            Command::Route(args) => {
                assert_eq!(args.level, "basic");
                assert_eq!(args.subscription, SubscriptionTier::Free);
            }
            _ => panic!("Expected route command"),
        }
    }

    #[test]
    fn test_parse_history_show() {
        let cli = Cli::try_parse_from([
            "llm-serving-core",
            "history",
            "show",
            "session-1",
            "--limit",
            "3",
        ])
        .unwrap();

        match cli.command {
            Command::History(history::HistoryCommand::Show { session_id, limit }) => {
                assert_eq!(session_id, "session-1");
                assert_eq!(limit, Some(3));
            }
            _ => panic!("Expected history show command"),
        }
    }

    #[test]
    fn test_parse_cache_invalidate() {
        let cli = Cli::try_parse_from([
            "llm-serving-core",
            "cache",
            "invalidate",
            "What is 2+2?",
            "--namespace",
            "math",
        ])
        .unwrap();

        match cli.command {
            Command::Cache(cache::CacheCommand::Invalidate { query, namespace }) => {
                assert_eq!(query, "What is 2+2?");
                assert_eq!(namespace, "math");
            }
            _ => panic!("Expected cache invalidate command"),
        }
    }

    #[test]
    fn test_rejects_unknown_subscription() {
        let result = Cli::try_parse_from([
            "llm-serving-core",
            "route",
            "--subject",
            "math",
            "--subscription",
            "platinum",
            "query",
        ]);

        assert!(result.is_err());
    }
}
