//! Redis-backed distributed counter store.
//!
//! Same contract as the in-memory store, but counters live in a shared Redis
//! instance so the quota holds across processes. Keys are
//! `prefix + identifier`; the count is an INCR with a PEXPIRE arming the
//! window on the first hit, and PTTL supplies the exact remaining wait on
//! rejection.
//!
//! A Redis fault (connectivity loss, timeout, command error) is
//! [`AdmissionError::BackendUnavailable`] — never a `Limited` decision.
//! Conflating the two would misreport an outage as a 429; the facade needs
//! the distinction to fail open.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::error::AdmissionError;
use crate::ratelimit::policy::{retry_after_secs, Decision, RateLimitPolicy};

/// Distributed fixed-window counter store.
pub struct RedisCounterStore {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    key_prefix: String,
}

impl RedisCounterStore {
    /// Create a store for the given connection URL.
    ///
    /// Only the URL is parsed here; the connection itself is established
    /// lazily on first use so a temporarily unreachable Redis delays nothing
    /// at startup.
    pub fn new(url: &str, key_prefix: impl Into<String>) -> Result<Self, AdmissionError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
            key_prefix: key_prefix.into(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, AdmissionError> {
        let manager = self
            .connection
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await?;
        Ok(manager.clone())
    }

    fn key_for(&self, identifier: &str) -> String {
        format!("{}{}", self.key_prefix, identifier)
    }

    /// Count one request against the shared window for `identifier`.
    pub async fn consume(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
    ) -> Result<Decision, AdmissionError> {
        let mut conn = self.connection().await?;
        let key = self.key_for(identifier);
        let window_ms = policy.window.as_millis() as i64;

        let count: u64 = conn.incr(&key, 1u32).await?;
        if count == 1 {
            let _: bool = conn.pexpire(&key, window_ms).await?;
        }

        let mut ttl_ms: i64 = conn.pttl(&key).await?;
        if ttl_ms < 0 {
            // Key exists without an expiry: a previous holder died between
            // INCR and PEXPIRE. Re-arm the window instead of leaking a
            // permanent counter.
            let _: bool = conn.pexpire(&key, window_ms).await?;
            ttl_ms = window_ms;
        }
        let resets_in = Duration::from_millis(ttl_ms as u64);

        if count > u64::from(policy.max_requests) {
            Ok(Decision::Limited {
                retry_after_secs: retry_after_secs(resets_in),
                resets_in,
            })
        } else {
            Ok(Decision::Allowed {
                remaining: policy.max_requests.saturating_sub(count as u32),
                resets_in,
            })
        }
    }
}

impl std::fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_carry_the_configured_prefix() {
        let store = RedisCounterStore::new("redis://127.0.0.1/", "rate_limit:").unwrap();
        assert_eq!(store.key_for("203.0.113.9"), "rate_limit:203.0.113.9");
    }

    #[test]
    fn malformed_url_is_a_backend_error() {
        let result = RedisCounterStore::new("not-a-redis-url", "rate_limit:");
        assert!(matches!(
            result,
            Err(AdmissionError::BackendUnavailable(_))
        ));
    }
}
