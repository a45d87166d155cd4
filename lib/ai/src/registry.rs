//! Provider registry.
//!
//! Holds every configured provider in registration order and answers
//! availability questions. Priority ordering is the orchestrator's job.

use crate::backend::{Provider, ProviderInfo};
use crate::config::ProvidersConfig;
use crate::error::ConfigError;
use crate::providers::{ChatGptProvider, GeminiProvider, OllamaProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// The set of known providers.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
    ollama: Option<Arc<OllamaProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates a registry from already-built providers.
    ///
    /// # Errors
    ///
    /// Returns an error if two providers share a name (case-insensitive).
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> courier_core::Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for provider in &providers {
            let name = provider.name().to_lowercase();
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateProvider { name }.into());
            }
        }
        Ok(Self {
            providers,
            ollama: None,
        })
    }

    /// Builds the ChatGPT, Gemini and Ollama providers from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any provider cannot be constructed.
    pub fn from_config(config: &ProvidersConfig) -> courier_core::Result<Self, ConfigError> {
        let timeout = config.request_timeout();
        let ollama = Arc::new(OllamaProvider::from_config(&config.ollama, timeout)?);
        let providers: Vec<Arc<dyn Provider>> = vec![
            Arc::new(ChatGptProvider::from_config(&config.openai, timeout)?),
            Arc::new(GeminiProvider::from_config(&config.gemini, timeout)?),
            Arc::clone(&ollama) as Arc<dyn Provider>,
        ];
        let mut registry = Self::new(providers)?;
        registry.ollama = Some(ollama);
        Ok(registry)
    }

    /// Every registered provider, available or not.
    #[must_use]
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Names of every registered provider.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Providers that are currently usable, in registration order.
    pub async fn list_available(&self) -> Vec<Arc<dyn Provider>> {
        let mut available = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            if provider.is_available().await {
                available.push(Arc::clone(provider));
            } else {
                debug!(provider = provider.name(), "provider unavailable");
            }
        }
        available
    }

    /// Looks up a provider by name, ignoring case.
    ///
    /// Returns `None` if the name is unknown or the provider is currently
    /// unavailable.
    pub async fn get_by_name(&self, name: &str) -> Option<Arc<dyn Provider>> {
        let name = name.trim();
        let provider = self
            .providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))?;
        provider.is_available().await.then(|| Arc::clone(provider))
    }

    /// Models installed in the local Ollama daemon.
    ///
    /// Empty when Ollama is not registered or cannot be reached.
    pub async fn local_models(&self) -> Vec<String> {
        match &self.ollama {
            Some(ollama) => ollama.list_models().await,
            None => Vec::new(),
        }
    }

    /// Info snapshots of every registered provider.
    pub async fn infos(&self) -> Vec<ProviderInfo> {
        let mut infos = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            infos.push(provider.info().await);
        }
        infos
    }
}
