//! Centralized CLI configuration.
//!
//! This module provides strongly-typed configuration for the command-line
//! front end, loaded via the `config` crate from environment variables
//! (optionally seeded from a `.env` file by `main`).
//!
//! The variables are flat (`OPENAI_API_KEY`, `FALLBACK_ORDER`, ...) and are
//! mapped onto the library's [`ProvidersConfig`] and [`FallbackConfig`].

use courier_ai::backend::DEFAULT_MAX_TOKENS;
use courier_ai::{FallbackConfig, KeyedProviderConfig, LocalProviderConfig, ProvidersConfig};
use serde::Deserialize;
use std::num::NonZeroU32;

/// CLI configuration read from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Whether other providers are tried when the preferred one fails.
    #[serde(default = "default_enable_fallback")]
    pub enable_fallback: bool,

    /// Comma-separated provider priority.
    #[serde(default = "default_fallback_order")]
    pub fallback_order: String,

    /// Provider used when none is given on the command line.
    #[serde(default = "default_ai_provider")]
    pub default_ai_provider: String,

    /// Token ceiling for one-shot queries.
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Token ceiling for chat turns.
    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,

    /// Timeout for generation requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub openai_model: Option<String>,
    #[serde(default)]
    pub openai_base_url: Option<String>,

    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub gemini_model: Option<String>,
    #[serde(default)]
    pub gemini_base_url: Option<String>,

    /// Ollama API base, e.g. `http://localhost:11434/api`.
    #[serde(default)]
    pub ollama_url: Option<String>,
    #[serde(default)]
    pub ollama_model_default: Option<String>,
}

fn default_enable_fallback() -> bool {
    true
}

fn default_fallback_order() -> String {
    "chatgpt,gemini,ollama".to_string()
}

fn default_ai_provider() -> String {
    "chatgpt".to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS.get()
}

fn default_chat_max_tokens() -> u32 {
    4000
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl CliConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed into its field type.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    /// Loads configuration from the given environment source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed into its field type.
    pub fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Fallback settings for the orchestrator.
    #[must_use]
    pub fn fallback(&self) -> FallbackConfig {
        FallbackConfig::new(self.enable_fallback, self.fallback_order.clone())
    }

    /// Provider settings for the registry.
    #[must_use]
    pub fn providers(&self) -> ProvidersConfig {
        ProvidersConfig {
            openai: KeyedProviderConfig {
                api_key: self.openai_api_key.clone(),
                model: self.openai_model.clone(),
                base_url: self.openai_base_url.clone(),
            },
            gemini: KeyedProviderConfig {
                api_key: self.gemini_api_key.clone(),
                model: self.gemini_model.clone(),
                base_url: self.gemini_base_url.clone(),
            },
            ollama: LocalProviderConfig {
                base_url: self.ollama_url.clone(),
                model: self.ollama_model_default.clone(),
                ..LocalProviderConfig::default()
            },
            request_timeout_secs: self.request_timeout_secs,
        }
    }

    /// Token ceiling for one-shot queries; zero falls back to the default.
    #[must_use]
    pub fn max_tokens(&self) -> NonZeroU32 {
        NonZeroU32::new(self.default_max_tokens).unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// Token ceiling for chat turns; zero falls back to the default.
    #[must_use]
    pub fn chat_max_tokens(&self) -> NonZeroU32 {
        NonZeroU32::new(self.chat_max_tokens).unwrap_or(DEFAULT_MAX_TOKENS)
    }
}
