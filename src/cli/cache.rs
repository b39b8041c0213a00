//! Cache commands

use clap::Subcommand;

use crate::config::AppConfig;
use crate::infrastructure::cache::{ExactCache, SemanticCache};

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Look up the exact-match entry for a query
    Lookup {
        query: String,

        #[arg(long)]
        namespace: String,
    },

    /// Remove the exact-match entry for a query
    Invalidate {
        query: String,

        #[arg(long)]
        namespace: String,
    },

    /// Remove every semantic entry in a namespace
    Purge {
        #[arg(long)]
        namespace: String,
    },
}

pub async fn run(config: &AppConfig, command: CacheCommand) -> anyhow::Result<()> {
    let manager = super::connection_manager(config)?;
    manager.ensure_connected().await?;

    match command {
        CacheCommand::Lookup { query, namespace } => {
            let cache = ExactCache::with_config(manager, config.exact_cache.clone());

            match cache.lookup(&query, &namespace).await {
                Some(entry) => {
                    println!("{}", entry.response);

                    if !entry.metadata.is_empty() {
                        println!("{}", serde_json::to_string_pretty(&entry.metadata)?);
                    }
                }
                None => println!("Miss"),
            }
        }
        CacheCommand::Invalidate { query, namespace } => {
            let cache = ExactCache::with_config(manager, config.exact_cache.clone());
            let removed = cache.invalidate(&query, &namespace).await;

            println!("{}", if removed { "Removed" } else { "Not cached" });
        }
        CacheCommand::Purge { namespace } => {
            let cache = SemanticCache::with_store(manager, config.semantic_cache.clone());
            let removed = cache.invalidate_namespace(&namespace).await;

            println!("Removed {} semantic entries from {}", removed, namespace);
        }
    }

    Ok(())
}
