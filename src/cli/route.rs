//! Route command - shows the handle a request resolves to

use std::sync::Arc;

use clap::Args;
use tracing::debug;

use crate::config::AppConfig;
use crate::domain::{Classification, SubscriptionTier};
use crate::infrastructure::registry::StaticModelRegistry;
use crate::infrastructure::routing::ModelRouter;

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Subject the request was classified under
    #[arg(long)]
    pub subject: String,

    /// Requested level: basic, intermediate or advanced
    #[arg(long, default_value = "basic")]
    pub level: String,

    /// Subscription plan of the caller
    #[arg(long, default_value = "free")]
    pub subscription: SubscriptionTier,

    /// Query text, used by keyword rules
    pub query: String,
}

pub async fn run(config: &AppConfig, args: RouteArgs) -> anyhow::Result<()> {
    let registry = StaticModelRegistry::from_file(&config.registry.path)?;
    let router = ModelRouter::with_config(Arc::new(registry), config.router.clone());
    let classification = Classification::new(args.subject, args.level);
    let handle = router
        .select(&classification, args.subscription, &args.query)
        .await;
    debug!(cached = router.cached_handles().await, "Route resolved");

    println!("handle:      {}", handle.key());
    println!("provider:    {}", handle.provider());
    println!("tier:        {}", handle.tier());
    println!("target:      {}", handle.target_id());
    println!("region:      {}", handle.region());
    println!("temperature: {}", handle.temperature());
    println!("max_tokens:  {}", handle.max_tokens());

    Ok(())
}
