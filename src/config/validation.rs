//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic parsing. Returns all
//! violations, not just the first, so an operator can fix a config file in
//! one pass.

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{AdmissionConfig, BackendKind};

/// A single semantic violation in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rate_limit.redis_url must be set when backend is \"redis\"")]
    MissingRedisUrl,

    #[error("route policy \"{group}\": max_requests must be at least 1")]
    ZeroMaxRequests { group: String },

    #[error("route policy \"{group}\": window_ms must be at least 1")]
    ZeroWindow { group: String },

    #[error("route policy group \"{group}\" is defined more than once")]
    DuplicateGroup { group: String },

    #[error("trust.probe_timeout_ms must be at least 1")]
    ZeroProbeTimeout,

    #[error("trust.cache_ttl_secs must be at least 1")]
    ZeroCacheTtl,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AdmissionConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rate_limit.backend == BackendKind::Redis && config.rate_limit.redis_url.is_empty() {
        errors.push(ValidationError::MissingRedisUrl);
    }

    let mut seen_groups = HashSet::new();
    for policy in &config.rate_limit.route_policies {
        if policy.max_requests == 0 {
            errors.push(ValidationError::ZeroMaxRequests {
                group: policy.group.clone(),
            });
        }
        if policy.window_ms == 0 {
            errors.push(ValidationError::ZeroWindow {
                group: policy.group.clone(),
            });
        }
        if !seen_groups.insert(policy.group.clone()) {
            errors.push(ValidationError::DuplicateGroup {
                group: policy.group.clone(),
            });
        }
    }

    if config.trust.probe_timeout_ms == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }
    if config.trust.cache_ttl_secs == 0 {
        errors.push(ValidationError::ZeroCacheTtl);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RoutePolicyConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AdmissionConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_violations() {
        let mut config = AdmissionConfig::default();
        config.rate_limit.backend = BackendKind::Redis;
        config.rate_limit.redis_url = String::new();
        config.rate_limit.route_policies = vec![
            RoutePolicyConfig {
                group: "auth".to_string(),
                window_ms: 0,
                max_requests: 0,
                message: None,
            },
            RoutePolicyConfig {
                group: "auth".to_string(),
                window_ms: 60_000,
                max_requests: 5,
                message: None,
            },
        ];
        config.trust.probe_timeout_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::MissingRedisUrl));
        assert!(errors.contains(&ValidationError::DuplicateGroup {
            group: "auth".to_string()
        }));
    }
}
