//! Google Gemini provider.

use super::{build_client, parse_base_url, read_json};
use crate::backend::{Provider, ProviderKind, QueryRequest};
use crate::config::{KeyedProviderConfig, non_blank_or};
use crate::error::{ConfigError, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const NAME: &str = "gemini";
const DISPLAY_NAME: &str = "Gemini (Google)";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Provider backed by the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    default_model: String,
    base_url: String,
}

impl GeminiProvider {
    /// Creates the provider from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &KeyedProviderConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = non_blank_or(config.base_url.as_deref(), DEFAULT_BASE_URL);
        Ok(Self {
            client: build_client(NAME, timeout)?,
            api_key: config.key().map(str::to_string),
            default_model: non_blank_or(config.model.as_deref(), DEFAULT_MODEL),
            base_url: parse_base_url(NAME, &base_url)?,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "topP")]
    top_p: f64,
    #[serde(rename = "topK")]
    top_k: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String, LlmError> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| LlmError::ResponseParseFailed {
                reason: "unexpected Gemini response format".to_string(),
            })
    }
}

fn request_body<'a>(request: &'a QueryRequest) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: [Content {
            parts: [TextPart {
                text: request.prompt(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: request.options().temperature(),
            max_output_tokens: request.max_tokens().get(),
            top_p: 0.8,
            top_k: 10,
        },
    }
}

impl GeminiProvider {
    fn generate_request(
        &self,
        api_key: &str,
        model: &str,
        request: &QueryRequest,
    ) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/{model}:generateContent", self.base_url))
            .header(API_KEY_HEADER, api_key)
            .json(&request_body(request))
    }
}

#[async_trait]
impl Provider for GeminiProvider {
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
        ProviderKind::KeyBased
    }

    async fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self, request), fields(provider = NAME))]
    async fn query(&self, request: &QueryRequest) -> Result<String, LlmError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(LlmError::ProviderUnavailable {
                provider: NAME.to_string(),
                reason: "API key not configured".to_string(),
            });
        };

        let model = request.resolve_model(&self.default_model);
        debug!(model, "sending generateContent request");
        let response = self
            .generate_request(api_key, model, request)
            .send()
            .await?;

        read_json::<GenerateResponse>(response).await?.into_text()
    }
}
