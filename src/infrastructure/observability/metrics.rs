//! Prometheus metrics infrastructure

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use super::config::MetricsConfig;

/// Cache layer a lookup was served by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLayer {
    Exact,
    Semantic,
}

impl CacheLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheLayer::Exact => "exact",
            CacheLayer::Semantic => "semantic",
        }
    }
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Hit,
    Miss,
    /// The lookup failed and was reported as a miss
    Error,
}

impl LookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupOutcome::Hit => "hit",
            LookupOutcome::Miss => "miss",
            LookupOutcome::Error => "error",
        }
    }
}

/// Installs the Prometheus recorder and its scrape listener
///
/// Returns whether metrics are being exported. Without a recorder the
/// `record_*` functions are no-ops.
pub fn init_metrics(config: &MetricsConfig) -> bool {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return false;
    }

    let addr: SocketAddr = match config.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(
                listen_addr = %config.listen_addr,
                error = %e,
                "Invalid metrics listen address"
            );
            return false;
        }
    };

    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            register_default_metrics();
            tracing::info!("Prometheus metrics listening on {}", addr);
            true
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            false
        }
    }
}

fn register_default_metrics() {
    gauge!("serving_core_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record a cache lookup
pub fn record_cache_lookup(layer: CacheLayer, outcome: LookupOutcome) {
    counter!(
        "serving_cache_lookups_total",
        "layer" => layer.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a router decision
pub fn record_router_selection(provider: &str, fallback: bool) {
    counter!(
        "serving_router_selections_total",
        "provider" => provider.to_string(),
        "fallback" => if fallback { "true" } else { "false" }
    )
    .increment(1);
}

/// Record a model generation
pub fn record_generation(provider: &str, success: bool, duration: Duration) {
    let labels = [
        ("provider", provider.to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];

    counter!("serving_generations_total", &labels).increment(1);
    histogram!("serving_generation_duration_seconds", &labels).record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_values() {
        assert_eq!(CacheLayer::Exact.as_str(), "exact");
        assert_eq!(CacheLayer::Semantic.as_str(), "semantic");
        assert_eq!(LookupOutcome::Hit.as_str(), "hit");
        assert_eq!(LookupOutcome::Miss.as_str(), "miss");
        assert_eq!(LookupOutcome::Error.as_str(), "error");
    }

    #[test]
    fn test_disabled_metrics_do_not_install() {
        assert!(!init_metrics(&MetricsConfig::default()));
    }

    #[test]
    fn test_invalid_listen_addr_is_rejected() {
        let config = MetricsConfig {
            enabled: true,
            listen_addr: "not an address".to_string(),
        };

        assert!(!init_metrics(&config));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_cache_lookup(CacheLayer::Exact, LookupOutcome::Miss);
        record_router_selection("anthropic", false);
        record_generation("anthropic", true, Duration::from_millis(5));
    }
}
