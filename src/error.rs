//! Error definitions for the admission subsystem.
//!
//! A `Limited` decision is *not* an error: over-quota is an expected outcome
//! and travels through [`crate::ratelimit::policy::Decision`]. The variants
//! here cover infrastructure faults, which the facade converts to fail-open
//! `Allowed` decisions at its boundary.

use thiserror::Error;

/// Errors that can occur while evaluating an admission decision.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The distributed counter store could not be reached or errored for a
    /// reason unrelated to quota. Distinct from a policy rejection.
    #[error("admission backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The supplied policy violates its invariants.
    #[error("invalid rate limit policy: {0}")]
    InvalidPolicy(String),
}

impl From<redis::RedisError> for AdmissionError {
    fn from(error: redis::RedisError) -> Self {
        Self::BackendUnavailable(error.to_string())
    }
}
