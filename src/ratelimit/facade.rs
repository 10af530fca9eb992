//! Rate limiter facade.
//!
//! Owns exactly one backend, chosen at construction from configuration, and
//! translates its decisions into observable side effects: headers on every
//! response, a warning plus degraded-mode counter on every fail-open.
//!
//! # Failure policy
//!
//! Any fault during evaluation (backend unreachable, malformed policy) is
//! caught here and converted to `Allowed`. The system fails open: during an
//! infrastructure outage we prefer serving unmetered traffic over rejecting
//! legitimate requests. Every occurrence is logged at warn and counted.

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use chrono::{SecondsFormat, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::schema::{BackendKind, RateLimitSettings};
use crate::error::AdmissionError;
use crate::observability::metrics;
use crate::ratelimit::memory::MemoryCounterStore;
use crate::ratelimit::policy::{Decision, RateLimitPolicy};
use crate::ratelimit::redis::RedisCounterStore;

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// The counter backend behind the facade.
pub enum AdmissionBackend {
    Memory(Arc<MemoryCounterStore>),
    Redis(RedisCounterStore),
}

impl AdmissionBackend {
    async fn consume(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
    ) -> Result<Decision, AdmissionError> {
        match self {
            AdmissionBackend::Memory(store) => Ok(store.consume(identifier, policy)),
            AdmissionBackend::Redis(store) => store.consume(identifier, policy).await,
        }
    }
}

/// Facade over the configured admission backend.
pub struct RateLimiter {
    backend: AdmissionBackend,
    degraded: AtomicU64,
}

impl RateLimiter {
    pub fn new(backend: AdmissionBackend) -> Self {
        Self {
            backend,
            degraded: AtomicU64::new(0),
        }
    }

    /// Build the limiter from configuration. The backend choice is final for
    /// the lifetime of the process.
    pub fn from_config(
        settings: &RateLimitSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AdmissionError> {
        let backend = match settings.backend {
            BackendKind::Memory => {
                AdmissionBackend::Memory(Arc::new(MemoryCounterStore::new(clock)))
            }
            BackendKind::Redis => AdmissionBackend::Redis(RedisCounterStore::new(
                &settings.redis_url,
                settings.key_prefix.clone(),
            )?),
        };
        tracing::info!(backend = ?settings.backend, "Rate limiter backend selected");
        Ok(Self::new(backend))
    }

    /// Evaluate one request. Never returns an error: faults fail open.
    pub async fn evaluate(&self, identifier: &str, policy: &RateLimitPolicy) -> Decision {
        let result = match policy.validate() {
            Ok(()) => self.backend.consume(identifier, policy).await,
            Err(error) => Err(error),
        };

        match result {
            Ok(decision) => decision,
            Err(error) => {
                self.degraded.fetch_add(1, Ordering::Relaxed);
                metrics::record_fail_open();
                tracing::warn!(
                    identifier = %identifier,
                    error = %error,
                    "Admission evaluation failed, allowing request (fail open)"
                );
                Decision::Allowed {
                    // Consumption is unknown while degraded; report the full
                    // quota rather than inventing a count.
                    remaining: policy.max_requests,
                    resets_in: policy.window,
                }
            }
        }
    }

    /// In-memory store behind this limiter, when that backend is configured.
    /// Used to wire up the sweeper at startup.
    pub fn memory_store(&self) -> Option<&Arc<MemoryCounterStore>> {
        match &self.backend {
            AdmissionBackend::Memory(store) => Some(store),
            AdmissionBackend::Redis(_) => None,
        }
    }

    /// How many evaluations have failed open since construction.
    pub fn degraded_count(&self) -> u64 {
        self.degraded.load(Ordering::Relaxed)
    }
}

/// Set the rate limit response headers for a decision.
///
/// Both variants carry `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
/// `X-RateLimit-Reset` (ISO-8601); `Limited` additionally sets `Retry-After`
/// in whole seconds.
pub fn apply_headers(headers: &mut HeaderMap, policy: &RateLimitPolicy, decision: &Decision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(policy.max_requests));

    let remaining = match decision {
        Decision::Allowed { remaining, .. } => *remaining,
        Decision::Limited { .. } => 0,
    };
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));

    let reset_at = Utc::now()
        + chrono::Duration::from_std(decision.resets_in()).unwrap_or(chrono::Duration::zero());
    if let Ok(value) = HeaderValue::from_str(&reset_at.to_rfc3339_opts(SecondsFormat::Secs, true)) {
        headers.insert(X_RATELIMIT_RESET, value);
    }

    if let Decision::Limited {
        retry_after_secs, ..
    } = decision
    {
        headers.insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use std::time::Duration;

    fn memory_limiter() -> RateLimiter {
        RateLimiter::new(AdmissionBackend::Memory(Arc::new(MemoryCounterStore::new(
            Arc::new(SystemClock::new()),
        ))))
    }

    #[tokio::test]
    async fn evaluate_counts_against_the_backend() {
        let limiter = memory_limiter();
        let policy = RateLimitPolicy::new(Duration::from_secs(60), 2);

        assert!(limiter.evaluate("user-7", &policy).await.is_allowed());
        assert!(limiter.evaluate("user-7", &policy).await.is_allowed());
        assert!(!limiter.evaluate("user-7", &policy).await.is_allowed());
        assert_eq!(limiter.degraded_count(), 0);
    }

    #[tokio::test]
    async fn malformed_policy_fails_open() {
        let limiter = memory_limiter();
        let broken = RateLimitPolicy::new(Duration::from_secs(60), 0);

        let decision = limiter.evaluate("user-7", &broken).await;
        assert!(decision.is_allowed());
        assert_eq!(limiter.degraded_count(), 1);
    }

    #[tokio::test]
    async fn unreachable_redis_fails_open() {
        // Nothing listens on port 1; the lazy connect fails per call and the
        // facade converts the fault to Allowed.
        let store = RedisCounterStore::new("redis://127.0.0.1:1/", "rate_limit:").unwrap();
        let limiter = RateLimiter::new(AdmissionBackend::Redis(store));
        let policy = RateLimitPolicy::new(Duration::from_secs(60), 1);

        for _ in 0..3 {
            assert!(limiter.evaluate("user-7", &policy).await.is_allowed());
        }
        assert_eq!(limiter.degraded_count(), 3);
    }

    #[tokio::test]
    async fn headers_reflect_the_decision() {
        let limiter = memory_limiter();
        let policy = RateLimitPolicy::new(Duration::from_secs(60), 1);

        let allowed = limiter.evaluate("user-8", &policy).await;
        let mut headers = HeaderMap::new();
        apply_headers(&mut headers, &policy, &allowed);
        assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "1");
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "0");
        assert!(headers.contains_key("x-ratelimit-reset"));
        assert!(!headers.contains_key(RETRY_AFTER));

        let limited = limiter.evaluate("user-8", &policy).await;
        let mut headers = HeaderMap::new();
        apply_headers(&mut headers, &policy, &limited);
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "0");
        let retry: u64 = headers
            .get(RETRY_AFTER)
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(retry >= 1);
    }
}
