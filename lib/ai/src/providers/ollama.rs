//! Local Ollama provider.
//!
//! Ollama runs as a daemon on the loopback interface and may be stopped at
//! any time, so it is probed before every generation request.

use super::{build_client, parse_base_url, read_json};
use crate::backend::{Provider, ProviderKind, QueryRequest};
use crate::config::{LocalProviderConfig, non_blank_or};
use crate::error::{ConfigError, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const NAME: &str = "ollama";
const DISPLAY_NAME: &str = "Ollama (Local)";
const DEFAULT_MODEL: &str = "gpt-oss:20b";
const DEFAULT_BASE_URL: &str = "http://localhost:11434/api";

/// Provider backed by a local Ollama daemon.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    probe_timeout: Duration,
    default_model: String,
    base_url: String,
}

impl OllamaProvider {
    /// Creates the provider from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &LocalProviderConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = non_blank_or(config.base_url.as_deref(), DEFAULT_BASE_URL);
        Ok(Self {
            client: build_client(NAME, timeout)?,
            probe_timeout: config.probe_timeout(),
            default_model: non_blank_or(config.model.as_deref(), DEFAULT_MODEL),
            base_url: parse_base_url(NAME, &base_url)?,
        })
    }

    /// The endpoint this provider talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists the models installed in the daemon.
    ///
    /// Returns an empty list if the daemon cannot be reached.
    pub async fn list_models(&self) -> Vec<String> {
        match self.fetch_tags(None).await {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                debug!(error = %e, "could not list Ollama models");
                Vec::new()
            }
        }
    }

    async fn fetch_tags(&self, timeout: Option<Duration>) -> Result<TagsResponse, LlmError> {
        let mut builder = self.client.get(format!("{}/tags", self.base_url));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        read_json(builder.send().await?).await
    }
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

fn request_body<'a>(request: &'a QueryRequest, model: &'a str) -> GenerateRequest<'a> {
    GenerateRequest {
        model,
        prompt: request.prompt(),
        stream: false,
        options: GenerateOptions {
            temperature: request.options().temperature(),
            num_predict: request.max_tokens().get(),
        },
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalDaemon
    }

    async fn is_available(&self) -> bool {
        match self.fetch_tags(Some(self.probe_timeout)).await {
            Ok(_) => true,
            Err(e) => {
                debug!(base_url = %self.base_url, error = %e, "Ollama liveness probe failed");
                false
            }
        }
    }

    #[instrument(skip(self, request), fields(provider = NAME))]
    async fn query(&self, request: &QueryRequest) -> Result<String, LlmError> {
        if !self.is_available().await {
            return Err(LlmError::ProviderUnavailable {
                provider: NAME.to_string(),
                reason: format!("daemon not reachable at {}", self.base_url),
            });
        }

        let model = request.resolve_model(&self.default_model);
        debug!(model, "sending generate request");
        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .json(&request_body(request, model))
            .send()
            .await?;

        let body: GenerateResponse = read_json(response).await?;
        Ok(body.response.trim().to_string())
    }
}
