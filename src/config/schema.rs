//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, with
//! `#[serde(default)]` so a partial file yields a working configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ratelimit::policy::RateLimitPolicy;

/// Root configuration for the admission core.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Rate limiter settings (backend selection, policies).
    pub rate_limit: RateLimitSettings,

    /// Trust verification settings (cache TTL, probe timeout).
    pub trust: TrustSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Which counter backend the facade uses, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process fixed-window counters. Also the fallback for single-node
    /// deployments.
    #[default]
    Memory,

    /// Shared Redis counters for multi-process deployments.
    Redis,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Counter backend to use.
    pub backend: BackendKind,

    /// Redis connection URL (only used when `backend = "redis"`).
    pub redis_url: String,

    /// Key prefix for shared-store counters.
    pub key_prefix: String,

    /// Interval between expired-window sweeps of the in-memory store,
    /// in seconds.
    pub sweep_interval_secs: u64,

    /// Per-route-group default policies. The routing layer picks the policy
    /// for each inbound request; these are its configured defaults.
    pub route_policies: Vec<RoutePolicyConfig>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            redis_url: "redis://127.0.0.1/".to_string(),
            key_prefix: "rate_limit:".to_string(),
            sweep_interval_secs: 60,
            route_policies: Vec::new(),
        }
    }
}

/// A named rate limit policy for one route group.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutePolicyConfig {
    /// Route group identifier (e.g., "auth", "payments", "public").
    pub group: String,

    /// Window duration in milliseconds.
    pub window_ms: u64,

    /// Maximum requests per window.
    pub max_requests: u32,

    /// Custom rejection message returned with 429 responses.
    pub message: Option<String>,
}

impl RoutePolicyConfig {
    /// Build the runtime policy for this route group.
    pub fn to_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            window: Duration::from_millis(self.window_ms),
            max_requests: self.max_requests,
            rejection_message: self.message.clone(),
        }
    }
}

/// Trust verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrustSettings {
    /// How long a trust report stays fresh, in seconds.
    pub cache_ttl_secs: u64,

    /// Hard deadline for the TLS reachability probe, in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for TrustSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 24 * 60 * 60,
            probe_timeout_ms: 5_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
