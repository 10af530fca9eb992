//! Pure trust scoring.
//!
//! Deterministic, no I/O. Scoring starts from a base of 50, adds 20 for a
//! valid TLS handshake, up to 30 for domain age (one point per month), and a
//! 25-point allow-list bonus capped at 100.
//!
//! The age heuristic is a stand-in for WHOIS data: a fixed table for a
//! handful of well-known domains, otherwise a string hash folded into
//! 1..=36 months. Any deterministic mapping would do; determinism is what
//! the cache-consistency guarantees rely on.

use crate::trust::report::TrustStatus;

/// Well-known domains with hand-assigned ages in months.
const KNOWN_DOMAIN_AGES: &[(&str, u32)] = &[
    ("google.com", 300),
    ("microsoft.com", 360),
    ("github.com", 200),
    ("stackoverflow.com", 180),
    ("example.com", 240),
];

/// Domains granted the allow-list bonus, matched exactly or as a parent of
/// the queried domain.
const SAFE_DOMAINS: &[&str] = &[
    "google.com",
    "microsoft.com",
    "github.com",
    "stackoverflow.com",
    "mozilla.org",
    "w3.org",
    "example.com",
];

/// Result of scoring one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Composite score, clamped to 0..=100.
    pub score: u32,
    pub status: TrustStatus,
    pub verified_business: bool,
}

/// Estimate a domain's age in months.
///
/// Same domain, same answer, on every call.
pub fn estimate_domain_age_months(domain: &str) -> u32 {
    if let Some((_, age)) = KNOWN_DOMAIN_AGES.iter().find(|(known, _)| *known == domain) {
        return *age;
    }

    let mut hash: i32 = 0;
    for ch in domain.chars() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(ch as i32);
    }
    (hash.unsigned_abs() % 36) + 1
}

/// Check the safe-domain allow list: exact match, or the queried domain is a
/// subdomain of an entry.
pub fn is_allowlisted(domain: &str) -> bool {
    SAFE_DOMAINS.iter().any(|safe| {
        domain == *safe
            || (domain.len() > safe.len() + 1
                && domain.ends_with(safe)
                && domain.as_bytes()[domain.len() - safe.len() - 1] == b'.')
    })
}

/// Score a domain from its probe result, age, and allow-list membership.
pub fn score(ssl_valid: bool, domain_age_months: u32, is_allowlisted: bool) -> ScoreBreakdown {
    let mut score: u32 = 50;

    if ssl_valid {
        score += 20;
    }
    score += domain_age_months.min(30);
    if is_allowlisted {
        score = (score + 25).min(100);
    }
    let score = score.min(100);

    let status = if score >= 85 {
        TrustStatus::Verified
    } else if score >= 70 {
        TrustStatus::Pending
    } else if score >= 50 {
        TrustStatus::Suspicious
    } else {
        TrustStatus::HighRisk
    };

    ScoreBreakdown {
        score,
        status,
        verified_business: score >= 80 && domain_age_months >= 12,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_marks_for_an_established_allowlisted_domain() {
        let breakdown = score(true, 30, true);
        assert_eq!(breakdown.score, 100);
        assert_eq!(breakdown.status, TrustStatus::Verified);
        assert!(breakdown.verified_business);
    }

    #[test]
    fn bare_minimum_domain_is_suspicious() {
        let breakdown = score(false, 0, false);
        assert_eq!(breakdown.score, 50);
        assert_eq!(breakdown.status, TrustStatus::Suspicious);
        assert!(!breakdown.verified_business);
    }

    #[test]
    fn score_never_exceeds_100() {
        // Known-age domains can push the raw sum well past the cap.
        let breakdown = score(true, 360, true);
        assert_eq!(breakdown.score, 100);
    }

    #[test]
    fn status_brackets() {
        assert_eq!(score(true, 30, false).status, TrustStatus::Verified); // 100
        assert_eq!(score(true, 0, false).status, TrustStatus::Pending); // 70
        assert_eq!(score(false, 15, false).status, TrustStatus::Suspicious); // 65
        assert_eq!(score(false, 0, false).status, TrustStatus::Suspicious); // 50
    }

    #[test]
    fn business_verification_needs_age_and_score() {
        // Score 80 but younger than a year.
        assert!(!score(true, 10, false).verified_business);
        // Old enough but score below 80.
        assert!(!score(false, 25, false).verified_business);
        // 50 + 20 + 12 = 82, age 12.
        assert!(score(true, 12, false).verified_business);
    }

    #[test]
    fn age_heuristic_is_deterministic_and_bounded() {
        for domain in ["ledger.example.net", "a.b.c", "x", "payments.acme.io"] {
            let first = estimate_domain_age_months(domain);
            assert_eq!(first, estimate_domain_age_months(domain));
            assert!((1..=36).contains(&first), "{domain} gave {first}");
        }
    }

    #[test]
    fn known_domains_use_the_fixed_table() {
        assert_eq!(estimate_domain_age_months("google.com"), 300);
        assert_eq!(estimate_domain_age_months("example.com"), 240);
    }

    #[test]
    fn allowlist_matches_exact_and_subdomains() {
        assert!(is_allowlisted("github.com"));
        assert!(is_allowlisted("pages.github.com"));
        assert!(!is_allowlisted("github.com.evil.example"));
        assert!(!is_allowlisted("notgithub.com"));
    }
}
