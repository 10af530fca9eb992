//! Metrics collection and exposition.
//!
//! Two layers:
//! - Process-wide counters/gauges via the `metrics` crate, scraped by
//!   Prometheus (`admission_rate_limited_total`, `admission_fail_open_total`,
//!   `trust_cache_entries`).
//! - [`RollingMetrics`], the per-service recorder behind the /status
//!   endpoint: request totals, cache hit rate, and an EMA of call latency.

use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Mutex;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Smoothing factor for the latency moving average.
const EMA_ALPHA: f64 = 0.2;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(error) => tracing::error!(error = %error, "Failed to install metrics exporter"),
    }
}

/// Record a rejected (429) request.
pub fn record_rate_limited(reason: &'static str) {
    metrics::counter!("admission_rate_limited_total", "reason" => reason).increment(1);
}

/// Record a fail-open event (backend fault converted to Allowed).
pub fn record_fail_open() {
    metrics::counter!("admission_fail_open_total").increment(1);
}

/// Record the current trust cache size.
pub fn record_cache_size(size: usize) {
    metrics::gauge!("trust_cache_entries").set(size as f64);
}

/// Point-in-time view of a service's rolling metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    /// Fraction of requests served from cache; 0 when no requests yet.
    pub cache_hit_rate: f64,
    pub average_duration_ms: f64,
    pub cache_size: usize,
}

#[derive(Debug, Default)]
struct Rolling {
    total_requests: u64,
    cache_hits: u64,
    average_duration_ms: f64,
}

/// Rolling counters and latency EMA for one service instance.
#[derive(Debug, Default)]
pub struct RollingMetrics {
    inner: Mutex<Rolling>,
}

impl RollingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call. The first sample sets the average directly; later
    /// samples fold in with weight [`EMA_ALPHA`].
    pub fn record(&self, duration_ms: f64, was_hit: bool) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        inner.total_requests += 1;
        if was_hit {
            inner.cache_hits += 1;
        }
        inner.average_duration_ms = if inner.total_requests == 1 {
            duration_ms
        } else {
            inner.average_duration_ms * (1.0 - EMA_ALPHA) + duration_ms * EMA_ALPHA
        };
    }

    /// Read-only snapshot; `cache_size` is supplied by the owning service.
    pub fn snapshot(&self, cache_size: usize) -> MetricsSnapshot {
        let inner = self.inner.lock().expect("metrics mutex poisoned");
        MetricsSnapshot {
            total_requests: inner.total_requests,
            cache_hit_rate: if inner.total_requests == 0 {
                0.0
            } else {
                inner.cache_hits as f64 / inner.total_requests as f64
            },
            average_duration_ms: inner.average_duration_ms,
            cache_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_has_zero_hit_rate() {
        let recorder = RollingMetrics::new();
        let snapshot = recorder.snapshot(0);
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.cache_hit_rate, 0.0);
        assert_eq!(snapshot.average_duration_ms, 0.0);
    }

    #[test]
    fn first_sample_sets_average_directly() {
        let recorder = RollingMetrics::new();
        recorder.record(40.0, false);
        assert_eq!(recorder.snapshot(0).average_duration_ms, 40.0);
    }

    #[test]
    fn later_samples_fold_in_with_alpha() {
        let recorder = RollingMetrics::new();
        recorder.record(100.0, false);
        recorder.record(50.0, true);

        let snapshot = recorder.snapshot(3);
        // 100 * 0.8 + 50 * 0.2
        assert!((snapshot.average_duration_ms - 90.0).abs() < 1e-9);
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.cache_hit_rate, 0.5);
        assert_eq!(snapshot.cache_size, 3);
    }
}
