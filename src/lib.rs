//! Admission-control and trust-scoring core for the ledger backend.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌────────────────────────────────────────────────┐
//!                  │              ADMISSION CORE                     │
//!                  │                                                 │
//!   request id ────┼─▶ ratelimit::facade ──▶ memory │ redis backend │
//!                  │        │                                        │
//!                  │        └─▶ Decision + X-RateLimit-* headers     │
//!                  │                                                 │
//!   domain ────────┼─▶ trust::service ──▶ single-flight cache        │
//!                  │        │                    │                   │
//!                  │        │                    └─▶ TLS probe       │
//!                  │        └─▶ TrustReport (score, status)          │
//!                  │                                                 │
//!                  │  ┌──────────────────────────────────────────┐   │
//!                  │  │          Cross-Cutting Concerns           │   │
//!                  │  │  config │ observability │ lifecycle       │   │
//!                  │  └──────────────────────────────────────────┘   │
//!                  └────────────────────────────────────────────────┘
//! ```
//!
//! The routing layer mounts [`ratelimit::middleware::admission_middleware`]
//! per route group and calls [`trust::TrustService::trust_report`] from the
//! verification endpoint. Everything else here is internal plumbing.
//!
//! Two failure policies run through the whole crate:
//! - Rate limiting **fails open**: a backend outage must never block
//!   legitimate traffic, only log and count the degradation.
//! - Trust probing **absorbs errors**: a slow or broken network call becomes
//!   `ssl_valid = false`, never an error surfaced to the caller.

// Core subsystems
pub mod ratelimit;
pub mod trust;

// Cross-cutting concerns
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::schema::AdmissionConfig;
pub use error::AdmissionError;
pub use lifecycle::Shutdown;
pub use ratelimit::facade::RateLimiter;
pub use ratelimit::policy::{Decision, RateLimitPolicy};
pub use trust::report::TrustReport;
pub use trust::service::TrustService;
