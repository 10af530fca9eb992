//! Trust verification service.
//!
//! Front door for the verification endpoint: serves cached reports inside
//! the TTL, collapses concurrent duplicate work per domain, and records
//! rolling metrics for the status endpoint. The caller is expected to have
//! validated `domain` against a hostname pattern already; this service does
//! not check input shape.

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::clock::Clock;
use crate::config::schema::TrustSettings;
use crate::observability::metrics::{self, MetricsSnapshot, RollingMetrics};
use crate::trust::cache::SingleFlight;
use crate::trust::probe::{ReachabilityProbe, TlsProbe};
use crate::trust::report::TrustReport;
use crate::trust::score::{estimate_domain_age_months, is_allowlisted, score};

/// Error generating a trust report.
///
/// Probe-level failures never show up here; they are absorbed into
/// `ssl_valid = false`. This variant covers genuine internal faults, and is
/// cloneable because every caller attached to the failed flight receives it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    #[error("failed to generate trust report for {domain}: {reason}")]
    Generation { domain: String, reason: String },
}

/// Domain trust verification service.
pub struct TrustService {
    cache: SingleFlight<String, TrustReport, TrustError>,
    probe: Arc<dyn ReachabilityProbe>,
    metrics: RollingMetrics,
}

impl TrustService {
    /// Build the service with the production TLS probe.
    pub fn new(settings: &TrustSettings, clock: Arc<dyn Clock>) -> Self {
        let probe = Arc::new(TlsProbe::new(Duration::from_millis(
            settings.probe_timeout_ms,
        )));
        Self::with_probe(settings, clock, probe)
    }

    /// Build the service with an injected probe. Tests use this to count
    /// probe invocations and control their latency.
    pub fn with_probe(
        settings: &TrustSettings,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn ReachabilityProbe>,
    ) -> Self {
        Self {
            cache: SingleFlight::new(Duration::from_secs(settings.cache_ttl_secs), clock),
            probe,
            metrics: RollingMetrics::new(),
        }
    }

    /// Get the trust report for a domain.
    ///
    /// Cached within the TTL; otherwise at most one probe runs per domain
    /// regardless of how many callers ask concurrently.
    pub async fn trust_report(&self, domain: &str) -> Result<TrustReport, TrustError> {
        let started = Instant::now();

        let probe = Arc::clone(&self.probe);
        let flight_domain = domain.to_string();
        let fetched = self
            .cache
            .get(domain.to_string(), async move {
                Ok(generate_report(probe.as_ref(), flight_domain).await)
            })
            .await?;

        let hit = fetched.is_hit();
        self.metrics
            .record(started.elapsed().as_secs_f64() * 1_000.0, hit);
        metrics::record_cache_size(self.cache.len());

        let report = fetched.into_value();
        tracing::debug!(
            domain = %report.domain,
            score = report.score,
            status = ?report.status,
            age_months = report.domain_age_months,
            ssl = report.ssl_valid,
            verified = report.verified_business,
            cache_hit = hit,
            "Trust report served"
        );
        Ok(report)
    }

    /// Invalidate all cached reports and in-flight probes. Idempotent.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Trust report cache cleared");
    }

    /// Rolling metrics for the status endpoint.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.cache.len())
    }
}

async fn generate_report(probe: &dyn ReachabilityProbe, domain: String) -> TrustReport {
    // Probe failures and timeouts come back as false; nothing to propagate.
    let ssl_valid = probe.check(&domain).await;
    let domain_age_months = estimate_domain_age_months(&domain);
    let breakdown = score(ssl_valid, domain_age_months, is_allowlisted(&domain));

    TrustReport {
        domain,
        score: breakdown.score,
        ssl_valid,
        verified_business: breakdown.verified_business,
        status: breakdown.status,
        domain_age_months,
        last_checked: Utc::now(),
    }
}
