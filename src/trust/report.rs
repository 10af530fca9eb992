//! Trust report value types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verification status derived from the trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustStatus {
    Verified,
    Pending,
    Suspicious,
    HighRisk,
}

/// Immutable trust report for one domain.
///
/// Serializes to the wire shape the verification endpoint returns
/// (camelCase fields, kebab-case status).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustReport {
    pub domain: String,

    /// Composite trust score, always within 0..=100.
    pub score: u32,

    pub ssl_valid: bool,
    pub verified_business: bool,
    pub status: TrustStatus,
    pub domain_age_months: u32,
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_the_endpoint_wire_shape() {
        let report = TrustReport {
            domain: "example.com".to_string(),
            score: 92,
            ssl_valid: true,
            verified_business: true,
            status: TrustStatus::Verified,
            domain_age_months: 240,
            last_checked: Utc::now(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sslValid"], true);
        assert_eq!(json["domainAgeMonths"], 240);
        assert_eq!(json["status"], "verified");

        let high_risk = serde_json::to_value(TrustStatus::HighRisk).unwrap();
        assert_eq!(high_risk, "high-risk");
    }
}
