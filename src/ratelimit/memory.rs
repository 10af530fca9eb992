//! In-process fixed-window counter store.
//!
//! The local backend and the fallback when no shared store is configured.
//! Each identifier owns one [`CounterRecord`]; the record is created on the
//! first request, incremented inside the window, and replaced wholesale once
//! the window has passed. Old counts are discarded on reset, so a burst
//! straddling the boundary can briefly exceed the quota. Known
//! characteristic of fixed windows, not a bug.
//!
//! Memory is bounded by a periodic sweep that drops records whose window has
//! passed. The sweep only runs when [`MemoryCounterStore::start_sweeper`] is
//! called and exits on the shutdown signal; tests simply never start it.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::ratelimit::policy::{retry_after_secs, Decision, RateLimitPolicy};

/// Per-identifier counter state. Owned exclusively by the store.
#[derive(Debug)]
struct CounterRecord {
    count: u32,
    window_reset_at: Instant,
}

/// Thread-safe fixed-window counter store.
pub struct MemoryCounterStore {
    records: DashMap<String, CounterRecord>,
    clock: Arc<dyn Clock>,
}

impl MemoryCounterStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    /// Count one request against `identifier` within the current window.
    ///
    /// Concurrent calls for the same identifier serialize on the entry
    /// guard, so increments are never lost.
    pub fn consume(&self, identifier: &str, policy: &RateLimitPolicy) -> Decision {
        let now = self.clock.now();
        let mut record = self
            .records
            .entry(identifier.to_string())
            .or_insert_with(|| CounterRecord {
                count: 0,
                window_reset_at: now + policy.window,
            });

        if now >= record.window_reset_at {
            // Window passed: replace, don't merge.
            record.count = 0;
            record.window_reset_at = now + policy.window;
        }

        record.count += 1;
        let resets_in = record.window_reset_at.saturating_duration_since(now);

        if record.count > policy.max_requests {
            Decision::Limited {
                retry_after_secs: retry_after_secs(resets_in),
                resets_in,
            }
        } else {
            Decision::Allowed {
                remaining: policy.max_requests - record.count,
                resets_in,
            }
        }
    }

    /// Drop every record whose window has passed. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.records.len();
        self.records
            .retain(|_, record| record.window_reset_at >= now);
        before.saturating_sub(self.records.len())
    }

    /// Number of identifiers currently tracked.
    pub fn tracked(&self) -> usize {
        self.records.len()
    }

    /// Start the periodic sweep task.
    ///
    /// Runs until the shutdown signal fires. The returned handle completes
    /// once the loop has exited.
    pub fn start_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.sweep_expired();
                        if removed > 0 {
                            tracing::debug!(
                                removed,
                                tracked = store.tracked(),
                                "Swept expired rate limit windows"
                            );
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Rate limit sweeper received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    fn store_with_clock() -> (MemoryCounterStore, MockClock) {
        let clock = MockClock::new(Instant::now());
        let store = MemoryCounterStore::new(Arc::new(clock.clone()));
        (store, clock)
    }

    fn policy() -> RateLimitPolicy {
        RateLimitPolicy::new(Duration::from_millis(60_000), 5)
    }

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let (store, _clock) = store_with_clock();
        let policy = policy();

        for i in 1..=5u32 {
            match store.consume("10.0.0.1", &policy) {
                Decision::Allowed { remaining, .. } => assert_eq!(remaining, 5 - i),
                other => panic!("request {i} should be allowed, got {other:?}"),
            }
        }

        match store.consume("10.0.0.1", &policy) {
            Decision::Limited {
                retry_after_secs, ..
            } => assert!(retry_after_secs > 0),
            other => panic!("request 6 should be limited, got {other:?}"),
        }
    }

    #[test]
    fn identifiers_do_not_interfere() {
        let (store, _clock) = store_with_clock();
        let policy = RateLimitPolicy::new(Duration::from_millis(60_000), 1);

        assert!(store.consume("a", &policy).is_allowed());
        assert!(!store.consume("a", &policy).is_allowed());
        assert!(store.consume("b", &policy).is_allowed());
    }

    #[test]
    fn window_expiry_restarts_counter() {
        let (store, clock) = store_with_clock();
        let policy = policy();

        for _ in 0..6 {
            store.consume("10.0.0.1", &policy);
        }
        assert!(!store.consume("10.0.0.1", &policy).is_allowed());

        clock.advance(Duration::from_millis(60_001));

        match store.consume("10.0.0.1", &policy) {
            Decision::Allowed { remaining, .. } => {
                // Counter restarted at 1: old count discarded, not merged.
                assert_eq!(remaining, 4);
            }
            other => panic!("fresh window should allow, got {other:?}"),
        }
    }

    #[test]
    fn sweep_removes_only_expired_records() {
        let (store, clock) = store_with_clock();
        let short = RateLimitPolicy::new(Duration::from_millis(10), 5);
        let long = RateLimitPolicy::new(Duration::from_millis(60_000), 5);

        store.consume("short-lived", &short);
        store.consume("long-lived", &long);
        assert_eq!(store.tracked(), 2);

        clock.advance(Duration::from_millis(11));
        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.tracked(), 1);
    }

    #[test]
    fn concurrent_consumers_never_lose_increments() {
        let (store, _clock) = store_with_clock();
        let store = Arc::new(store);
        let policy = RateLimitPolicy::new(Duration::from_millis(60_000), 100);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let policy = policy.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .filter(|_| store.consume("shared", &policy).is_allowed())
                        .count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // 400 attempts against a quota of 100: exactly the quota gets through.
        assert_eq!(allowed, 100);
    }
}
