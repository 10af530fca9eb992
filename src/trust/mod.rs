//! Domain trust verification subsystem.
//!
//! # Data Flow
//! ```text
//! trust_report(domain):
//!     → cache.rs (single-flight: hit, attach, or compute)
//!         → probe.rs (TLS reachability, hard 5s deadline)
//!         → score.rs (pure scoring: ssl + age + allowlist)
//!     → TrustReport (cached for the TTL)
//! ```
//!
//! # Design Decisions
//! - The probe is a total function: errors and timeouts become
//!   `ssl_valid = false`, never a surfaced failure.
//! - At most one probe per domain is in flight at any instant; concurrent
//!   callers attach to the running computation.
//! - The age heuristic is a deterministic placeholder for WHOIS data. Its
//!   determinism is load-bearing for cache consistency, its values are not.

pub mod cache;
pub mod probe;
pub mod report;
pub mod score;
pub mod service;

pub use report::{TrustReport, TrustStatus};
pub use service::{TrustError, TrustService};
