//! Provider and fallback configuration.
//!
//! These types are deserialized by the embedding application and passed
//! explicitly into the registry and orchestrator. Nothing in this crate
//! reads the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fallback behaviour for orchestrated queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Whether other providers are tried after the preferred one fails.
    /// Default: true
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Priority order as a comma-separated list of provider names.
    /// Default: "chatgpt,gemini,ollama"
    #[serde(default = "default_order")]
    order: String,
}

fn default_enabled() -> bool {
    true
}

fn default_order() -> String {
    "chatgpt,gemini,ollama".to_string()
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            order: default_order(),
        }
    }
}

impl FallbackConfig {
    /// Creates a configuration from a flag and a comma-separated order.
    #[must_use]
    pub fn new(enabled: bool, order: impl Into<String>) -> Self {
        Self {
            enabled,
            order: order.into(),
        }
    }

    /// Returns the configured order: trimmed, lowercased, blanks dropped.
    #[must_use]
    pub fn order(&self) -> Vec<String> {
        self.order
            .split(',')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Returns the raw order string.
    #[must_use]
    pub fn order_raw(&self) -> &str {
        &self.order
    }
}

/// Settings for a provider authenticated with an API key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedProviderConfig {
    /// Secret key. The provider is unavailable without one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Default model override.
    #[serde(default)]
    pub model: Option<String>,
    /// Endpoint override.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl KeyedProviderConfig {
    /// Creates a configuration holding just a key.
    #[must_use]
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Returns the key if it is set and not blank.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Settings for a provider running on the local machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalProviderConfig {
    /// Endpoint override.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Default model override.
    #[serde(default)]
    pub model: Option<String>,
    /// Liveness probe timeout in seconds.
    /// Default: 5
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_probe_timeout_secs() -> u64 {
    5
}

impl LocalProviderConfig {
    /// Liveness probe timeout; zero falls back to the default.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        non_zero_secs(self.probe_timeout_secs, default_probe_timeout_secs())
    }
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: None,
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

/// Settings for every known provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenAI (ChatGPT).
    #[serde(default)]
    pub openai: KeyedProviderConfig,
    /// Google Gemini.
    #[serde(default)]
    pub gemini: KeyedProviderConfig,
    /// Local Ollama.
    #[serde(default)]
    pub ollama: LocalProviderConfig,
    /// Timeout for generation requests, in seconds.
    /// Default: 120
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl ProvidersConfig {
    /// Generation request timeout; zero falls back to the default.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        non_zero_secs(self.request_timeout_secs, default_request_timeout_secs())
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: KeyedProviderConfig::default(),
            gemini: KeyedProviderConfig::default(),
            ollama: LocalProviderConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn non_zero_secs(secs: u64, default_secs: u64) -> Duration {
    Duration::from_secs(if secs == 0 { default_secs } else { secs })
}

/// Returns `value` if it is set and not blank, else `default`.
pub(crate) fn non_blank_or(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}
