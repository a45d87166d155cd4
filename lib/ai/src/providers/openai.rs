//! OpenAI chat completions provider.

use super::{build_client, parse_base_url, read_json};
use crate::backend::{Provider, ProviderKind, QueryRequest};
use crate::config::{KeyedProviderConfig, non_blank_or};
use crate::error::{ConfigError, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const NAME: &str = "chatgpt";
const DISPLAY_NAME: &str = "ChatGPT (OpenAI)";
const DEFAULT_MODEL: &str = "gpt-5-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider backed by the OpenAI chat completions API.
#[derive(Debug, Clone)]
pub struct ChatGptProvider {
    client: Client,
    api_key: Option<String>,
    default_model: String,
    base_url: String,
}

impl ChatGptProvider {
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
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ResponseParseFailed {
                reason: "response contained no choices".to_string(),
            })?;
        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}

#[async_trait]
impl Provider for ChatGptProvider {
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
        let body = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: request.prompt(),
            }],
            max_completion_tokens: request.max_tokens().get(),
            temperature: request.options().explicit_temperature(),
        };

        debug!(model, "sending chat completion request");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        read_json::<ChatResponse>(response).await?.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<String, LlmError> {
        serde_json::from_value::<ChatResponse>(value)
            .expect("deserialize")
            .into_text()
    }

    #[test]
    fn extracts_trimmed_content() {
        let text = parse(json!({
            "choices": [{"message": {"role": "assistant", "content": "  Hello there.\n"}}]
        }))
        .expect("text");
        assert_eq!(text, "Hello there.");
    }

    #[test]
    fn null_content_is_empty() {
        let text = parse(json!({"choices": [{"message": {"content": null}}]})).expect("text");
        assert!(text.is_empty());
    }

    #[test]
    fn missing_choices_is_parse_error() {
        assert!(matches!(
            parse(json!({"id": "chatcmpl-1"})),
            Err(LlmError::ResponseParseFailed { .. })
        ));
    }

    #[test]
    fn request_body_shape() {
        let request = QueryRequest::new("Say hi").expect("valid prompt");
        let body = ChatRequest {
            model: "gpt-5-mini",
            messages: [ChatMessage {
                role: "user",
                content: request.prompt(),
            }],
            max_completion_tokens: request.max_tokens().get(),
            temperature: request.options().explicit_temperature(),
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["messages"][0]["content"], "Say hi");
        assert_eq!(value["max_completion_tokens"], 2000);
        assert!(value.get("temperature").is_none());
    }

    #[tokio::test]
    async fn availability_follows_key() {
        let timeout = Duration::from_secs(1);
        let without = ChatGptProvider::from_config(&KeyedProviderConfig::default(), timeout)
            .expect("provider");
        assert!(!without.is_available().await);

        let with = ChatGptProvider::from_config(&KeyedProviderConfig::with_key("sk-test"), timeout)
            .expect("provider");
        assert!(with.is_available().await);
        assert_eq!(with.default_model(), DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn query_without_key_fails_without_request() {
        let provider =
            ChatGptProvider::from_config(&KeyedProviderConfig::default(), Duration::from_secs(1))
                .expect("provider");
        let request = QueryRequest::new("hi").expect("valid prompt");
        assert!(matches!(
            provider.query(&request).await,
            Err(LlmError::ProviderUnavailable { .. })
        ));
    }
}
