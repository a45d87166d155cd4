//! Error types for the AI crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `LlmError`: Failures of a single provider call
//! - `ConfigError`: Failures while building providers from configuration

use std::fmt;

/// Maximum number of characters of a backend error body kept in messages.
const MAX_BODY_CHARS: usize = 200;

/// Errors from provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Provider is unavailable.
    ProviderUnavailable { provider: String, reason: String },
    /// The request was rejected before being sent.
    InvalidRequest { reason: String },
    /// Could not connect to the backend.
    ConnectionFailed { reason: String },
    /// Request failed in transit.
    RequestFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// Backend refused the credentials or the account has no access.
    Rejected { status: u16, reason: String },
    /// Backend answered with any other non-success status.
    HttpStatus { status: u16, body: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
}

impl LlmError {
    /// Builds the error for a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16, retry_after_secs: Option<u64>, body: &str) -> Self {
        let body = truncate(body.trim(), MAX_BODY_CHARS);
        match status {
            429 => Self::RateLimited { retry_after_secs },
            401 | 403 => Self::Rejected {
                status,
                reason: body,
            },
            _ => Self::HttpStatus { status, body },
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::ConnectionFailed {
                reason: err.to_string(),
            }
        } else if err.is_decode() {
            Self::ResponseParseFailed {
                reason: err.to_string(),
            }
        } else {
            Self::RequestFailed {
                reason: err.to_string(),
            }
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "provider '{provider}' unavailable: {reason}")
            }
            Self::InvalidRequest { reason } => {
                write!(f, "invalid request: {reason}")
            }
            Self::ConnectionFailed { reason } => {
                write!(f, "connection failed: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "network request failed: {reason}")
            }
            Self::Timeout => write!(f, "LLM request timeout"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "HTTP 429: rate limit exceeded, retry after {secs}s")
                } else {
                    write!(f, "HTTP 429: rate limit exceeded")
                }
            }
            Self::Rejected { status, reason } => {
                let label = if *status == 401 {
                    "unauthorized"
                } else {
                    "forbidden"
                };
                write!(f, "HTTP {status} {label}: {reason}")
            }
            Self::HttpStatus { status, body } => {
                write!(f, "HTTP {status}: {body}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Errors from building providers out of configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The HTTP client for a provider could not be built.
    HttpClient { provider: String, reason: String },
    /// A configured base URL is not a valid URL.
    InvalidBaseUrl {
        provider: String,
        url: String,
        reason: String,
    },
    /// Two providers were registered under the same name.
    DuplicateProvider { name: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpClient { provider, reason } => {
                write!(f, "failed to build HTTP client for '{provider}': {reason}")
            }
            Self::InvalidBaseUrl {
                provider,
                url,
                reason,
            } => {
                write!(f, "invalid base URL '{url}' for '{provider}': {reason}")
            }
            Self::DuplicateProvider { name } => {
                write!(f, "provider '{name}' registered more than once")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
