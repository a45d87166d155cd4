//! Provider abstraction.
//!
//! Provides a unified interface over interchangeable text-generation
//! backends: remote services authenticated with an API key, and local
//! daemons that must be probed before use.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::num::NonZeroU32;

/// Token ceiling used when the caller does not pick one.
pub const DEFAULT_MAX_TOKENS: NonZeroU32 = match NonZeroU32::new(2000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Sampling temperature used when the options bag does not set one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// How a provider is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Remote HTTPS service authenticated with a secret key.
    KeyBased,
    /// Service on the local loopback that may not be running.
    LocalDaemon,
}

impl ProviderKind {
    /// Returns a short label for display.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyBased => "remote",
            Self::LocalDaemon => "local",
        }
    }
}

/// Read-only snapshot of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Unique lowercase name.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Model used when a request does not override it.
    pub default_model: String,
    /// Transport variant.
    pub kind: ProviderKind,
    /// Whether the provider was usable when the snapshot was taken.
    pub available: bool,
}

/// Free-form per-request options (e.g. temperature).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryOptions(HashMap<String, JsonValue>);

impl QueryOptions {
    /// Creates an empty options bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(self, temperature: f64) -> Self {
        self.with("temperature", JsonValue::from(temperature))
    }

    /// Returns a raw option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Returns the sampling temperature, or the default when unset.
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.explicit_temperature().unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Returns the sampling temperature only if the caller set one.
    #[must_use]
    pub fn explicit_temperature(&self) -> Option<f64> {
        self.get("temperature").and_then(JsonValue::as_f64)
    }
}

/// A request to a provider.
///
/// Built once by the prompt source and shared by every attempt of one
/// orchestrated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQueryRequest")]
pub struct QueryRequest {
    prompt: String,
    model: Option<String>,
    max_tokens: NonZeroU32,
    options: QueryOptions,
}

impl QueryRequest {
    /// Creates a request for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidRequest` if the prompt is empty or only
    /// whitespace.
    pub fn new(prompt: impl Into<String>) -> Result<Self, LlmError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(LlmError::InvalidRequest {
                reason: "prompt must not be empty".to_string(),
            });
        }
        Ok(Self {
            prompt,
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            options: QueryOptions::default(),
        })
    }

    /// Overrides the model. An empty name keeps the provider default.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model = (!model.trim().is_empty()).then_some(model);
        self
    }

    /// Sets the token ceiling.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: NonZeroU32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Replaces the options bag.
    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// The prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The explicit model override, if any.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// The token ceiling.
    #[must_use]
    pub fn max_tokens(&self) -> NonZeroU32 {
        self.max_tokens
    }

    /// The options bag.
    #[must_use]
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Resolves the model to use against a provider's default.
    #[must_use]
    pub fn resolve_model<'a>(&'a self, default_model: &'a str) -> &'a str {
        self.model()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or(default_model)
    }
}

/// Wire form of `QueryRequest`, validated on conversion.
#[derive(Deserialize)]
struct RawQueryRequest {
    prompt: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default = "default_max_tokens")]
    max_tokens: NonZeroU32,
    #[serde(default)]
    options: QueryOptions,
}

fn default_max_tokens() -> NonZeroU32 {
    DEFAULT_MAX_TOKENS
}

impl TryFrom<RawQueryRequest> for QueryRequest {
    type Error = LlmError;

    fn try_from(raw: RawQueryRequest) -> Result<Self, Self::Error> {
        let mut request = Self::new(raw.prompt)?
            .with_max_tokens(raw.max_tokens)
            .with_options(raw.options);
        if let Some(model) = raw.model {
            request = request.with_model(model);
        }
        Ok(request)
    }
}

/// Trait for text-generation providers.
///
/// Implementations issue exactly one backend request per `query` call and
/// never retry; ordering and fallback belong to the orchestrator.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique lowercase name.
    fn name(&self) -> &str;

    /// Human-readable name.
    fn display_name(&self) -> &str;

    /// Model used when a request does not override it.
    fn default_model(&self) -> &str;

    /// Transport variant.
    fn kind(&self) -> ProviderKind;

    /// Checks whether the provider can currently serve requests.
    ///
    /// Never fails: any probe error counts as unavailable.
    async fn is_available(&self) -> bool;

    /// Sends the request and returns the trimmed response text.
    ///
    /// An empty string is a successful call that produced nothing.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a malformed response, or a
    /// rejection by the backend.
    async fn query(&self, request: &QueryRequest) -> Result<String, LlmError>;

    /// Returns a snapshot of this provider.
    async fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name().to_string(),
            display_name: self.display_name().to_string(),
            default_model: self.default_model().to_string(),
            kind: self.kind(),
            available: self.is_available().await,
        }
    }
}
