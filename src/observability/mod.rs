//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! ratelimit + trust produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (process counters + per-service rolling recorder)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Prometheus scrape endpoint
//!     → /status endpoint (rolling snapshot via TrustService::metrics)
//! ```
//!
//! # Design Decisions
//! - Fail-open events always log at warn: degraded enforcement must be
//!   visible even with default filters.
//! - The rolling recorder is owned per service instance, not global, so
//!   isolated test instances see isolated numbers.

pub mod logging;
pub mod metrics;
