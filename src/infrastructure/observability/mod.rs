//! Observability infrastructure - Metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    CacheLayer, LookupOutcome, init_metrics, record_cache_lookup, record_generation,
    record_router_selection,
};
