//! Concrete providers and their shared HTTP plumbing.

mod gemini;
mod ollama;
mod openai;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::ChatGptProvider;

use crate::error::{ConfigError, LlmError};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Builds the HTTP client a provider keeps for its lifetime.
pub(crate) fn build_client(provider: &str, timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient {
            provider: provider.to_string(),
            reason: e.to_string(),
        })
}

/// Validates a base URL and strips any trailing slash.
pub(crate) fn parse_base_url(provider: &str, url: &str) -> Result<String, ConfigError> {
    Url::parse(url).map_err(|e| ConfigError::InvalidBaseUrl {
        provider: provider.to_string(),
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(url.trim_end_matches('/').to_string())
}

/// Decodes a JSON body, turning non-success statuses into errors.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, LlmError> {
    let status = response.status();
    if !status.is_success() {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::from_status(
            status.as_u16(),
            retry_after_secs,
            &body,
        ));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| LlmError::ResponseParseFailed {
        reason: e.to_string(),
    })
}
