//! Advisory classification of provider failures.
//!
//! The category only chooses which log line is written for a failed
//! attempt. It never changes which provider is tried next.

use serde::{Deserialize, Serialize};
use std::fmt;

const QUOTA_AUTH_TERMS: &[&str] = &[
    "rate limit",
    "quota exceeded",
    "billing",
    "unauthorized",
    "forbidden",
    "429",
    "403",
];

const TRANSPORT_TERMS: &[&str] = &["timeout", "connection", "network"];

/// Coarse category of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rate limiting, exhausted quota, billing or credential problems.
    QuotaAuth,
    /// Timeouts and connectivity failures.
    Transport,
    /// Anything else.
    Unclassified,
}

impl ErrorCategory {
    /// Returns the category label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuotaAuth => "quota/auth",
            Self::Transport => "transport",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an error message by case-insensitive keyword match.
///
/// Quota/auth terms are checked before transport terms.
#[must_use]
pub fn classify(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    let matches = |terms: &[&str]| terms.iter().any(|term| lower.contains(term));

    if matches(QUOTA_AUTH_TERMS) {
        ErrorCategory::QuotaAuth
    } else if matches(TRANSPORT_TERMS) {
        ErrorCategory::Transport
    } else {
        ErrorCategory::Unclassified
    }
}
