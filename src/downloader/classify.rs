// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diagnostic classification for downloader output.
//!
//! The external downloader's message wording is not a stable contract, so
//! the substring patterns live here and nowhere else; the retry loop only
//! sees the classified result.

use std::fmt;

/// Transient conditions worth one automatic retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    /// Browser cookies were rejected; often a one-off that clears on retry
    CookieWarning,
    /// Name resolution failed; usually a short network blip
    DnsFailure,
}

impl TransientKind {
    /// Cooldown to observe before retrying this condition, in seconds
    pub fn cooldown_secs(self) -> u64 {
        match self {
            Self::CookieWarning => 0,
            Self::DnsFailure => 60,
        }
    }
}

impl fmt::Display for TransientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CookieWarning => write!(f, "cookie warning"),
            Self::DnsFailure => write!(f, "DNS resolution failure"),
        }
    }
}

const COOKIE_WARNING_PATTERNS: &[&str] = &["cookies are no longer valid"];

const DNS_FAILURE_PATTERNS: &[&str] = &["failed to resolve", "getaddrinfo failed"];

/// Patterns that indicate a persistent auth problem on an otherwise
/// unclassified failure; these abort the whole batch
const AUTH_FAILURE_PATTERNS: &[&str] = &["cookies", "authentication"];

fn matches_any(diagnostics_lower: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| diagnostics_lower.contains(p))
}

/// Detect a transient condition in the downloader's diagnostic output
///
/// Matching is case-insensitive substring search. Checked before the exit
/// code: the downloader reports cookie trouble as a warning even on runs
/// that exit zero.
pub fn classify_transient(diagnostics: &str) -> Option<TransientKind> {
    let lower = diagnostics.to_lowercase();
    if matches_any(&lower, COOKIE_WARNING_PATTERNS) {
        return Some(TransientKind::CookieWarning);
    }
    if matches_any(&lower, DNS_FAILURE_PATTERNS) {
        return Some(TransientKind::DnsFailure);
    }
    None
}

/// Whether an unclassified failure looks like a persistent auth failure
pub fn is_auth_failure(diagnostics: &str) -> bool {
    matches_any(&diagnostics.to_lowercase(), AUTH_FAILURE_PATTERNS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cookie_warning() {
        assert_eq!(
            classify_transient("WARNING: Cookies are no longer valid, ignoring"),
            Some(TransientKind::CookieWarning)
        );
    }

    #[test]
    fn detects_dns_failure_variants() {
        assert_eq!(
            classify_transient("ERROR: Failed to resolve www.youtube.com"),
            Some(TransientKind::DnsFailure)
        );
        assert_eq!(
            classify_transient("urlopen error: getaddrinfo failed"),
            Some(TransientKind::DnsFailure)
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            classify_transient("FAILED TO RESOLVE host"),
            Some(TransientKind::DnsFailure)
        );
    }

    #[test]
    fn cookie_warning_wins_over_dns() {
        // Both patterns present: cookie classification takes precedence
        let diagnostics = "cookies are no longer valid; also failed to resolve";
        assert_eq!(
            classify_transient(diagnostics),
            Some(TransientKind::CookieWarning)
        );
    }

    #[test]
    fn clean_output_is_unclassified() {
        assert_eq!(classify_transient(""), None);
        assert_eq!(classify_transient("[download] 100% of 3.4MiB"), None);
    }

    #[test]
    fn auth_failure_matches_cookie_and_authentication_text() {
        assert!(is_auth_failure("ERROR: Cookies required for this video"));
        assert!(is_auth_failure("HTTP Error 401: Authentication required"));
        assert!(!is_auth_failure("ERROR: Video unavailable"));
    }

    #[test]
    fn cooldowns_per_kind() {
        assert_eq!(TransientKind::CookieWarning.cooldown_secs(), 0);
        assert_eq!(TransientKind::DnsFailure.cooldown_secs(), 60);
    }
}
