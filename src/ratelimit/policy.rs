//! Rate limit policies and admission decisions.

use std::time::Duration;

use crate::error::AdmissionError;

/// An immutable rate limit policy, supplied by the routing layer per route
/// group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Length of the counting window.
    pub window: Duration,

    /// Maximum requests allowed per window. Must be at least 1.
    pub max_requests: u32,

    /// Custom message returned with 429 responses.
    pub rejection_message: Option<String>,
}

impl RateLimitPolicy {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            rejection_message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.rejection_message = Some(message.into());
        self
    }

    /// Check policy invariants. The facade treats a violation like any other
    /// evaluation fault: log, count, fail open.
    pub(crate) fn validate(&self) -> Result<(), AdmissionError> {
        if self.max_requests == 0 {
            return Err(AdmissionError::InvalidPolicy(
                "max_requests must be at least 1".to_string(),
            ));
        }
        if self.window.is_zero() {
            return Err(AdmissionError::InvalidPolicy(
                "window must be at least 1ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of evaluating one request against a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Request is within quota.
    Allowed {
        /// Requests left in the current window.
        remaining: u32,
        /// Time until the window resets.
        resets_in: Duration,
    },

    /// Request is over quota. An expected outcome, not an error.
    Limited {
        /// Whole seconds the client should wait before retrying
        /// (rounded up, always at least 1).
        retry_after_secs: u64,
        /// Time until the window resets.
        resets_in: Duration,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Time until the current window resets, whichever variant.
    pub fn resets_in(&self) -> Duration {
        match self {
            Decision::Allowed { resets_in, .. } | Decision::Limited { resets_in, .. } => *resets_in,
        }
    }
}

/// Round a wait duration up to whole seconds, never reporting zero for a
/// non-empty wait.
pub(crate) fn retry_after_secs(wait: Duration) -> u64 {
    let millis = wait.as_millis() as u64;
    millis.div_ceil(1000).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_max_requests_is_invalid() {
        let policy = RateLimitPolicy::new(Duration::from_secs(60), 0);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn zero_window_is_invalid() {
        let policy = RateLimitPolicy::new(Duration::ZERO, 5);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(1000)), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(1001)), 2);
        assert_eq!(retry_after_secs(Duration::from_millis(59_500)), 60);
    }
}
