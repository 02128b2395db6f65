//! OpenAI-compatible chat completions client

use crate::error::{ApiError, ProviderError};
use crate::provider::{ProgramGenerator, ProviderConfig, RequestShape};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct HttpProgramGenerator {
    client: Client,
    name: String,
    model: String,
    base_url: String,
    api_key: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl HttpProgramGenerator {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ApiError> {
        let base_url = config.resolved_endpoint().ok_or_else(|| {
            ApiError::ProviderNotConfigured(format!(
                "Provider '{}' has no endpoint",
                config.provider_type.as_str()
            ))
        })?;
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ApiError::ProviderError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            name: config.provider_type.as_str().to_string(),
            model: config.model.clone(),
            base_url,
            api_key: config.resolved_api_key(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ProgramGenerator for HttpProgramGenerator {
    async fn generate(&self, shape: &RequestShape) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: shape.system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: shape.user_prompt(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_retry_after);
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status.as_u16(), retry_after, &body));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Failed to parse response: {}", e)))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::Malformed("Response contained no content".to_string()))?;

        debug!(
            provider = %self.name,
            model = %self.model,
            attempt = shape.attempt,
            bytes = content.len(),
            "Provider responded"
        );
        Ok(content)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}

fn map_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::TimedOut(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ProviderError::TimedOut(format!("Connection error: {}", error))
    } else if error.is_builder() {
        ProviderError::Fatal(format!("Invalid request: {}", error))
    } else {
        ProviderError::TimedOut(format!("HTTP error: {}", error))
    }
}

/// Map a non-success status to the provider error taxonomy.
pub(crate) fn classify_status(status: u16, retry_after: Option<Duration>, body: &str) -> ProviderError {
    match status {
        429 | 503 => ProviderError::RateLimited {
            message: format!("status {}: {}", status, body),
            retry_after,
        },
        500..=599 => ProviderError::TimedOut(format!("Server error {}: {}", status, body)),
        401 | 403 => ProviderError::Fatal(format!("Authentication failed ({}): {}", status, body)),
        404 => ProviderError::Fatal(format!("Model or endpoint not found: {}", body)),
        _ => ProviderError::Fatal(format!("Request rejected with status {}: {}", status, body)),
    }
}

/// Seconds form of `Retry-After`. HTTP-date values are ignored.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
