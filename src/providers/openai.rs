//! OpenAI-compatible chat completion provider
//!
//! Sends one `POST {api_base}/chat/completions` request per call and maps the
//! outcome onto [`CoachError`] so the retry policy and the classifier can tell
//! rate limits, server faults and bad requests apart.

use crate::config::ProviderConfig;
use crate::error::{CoachError, Result};
use crate::providers::{ChatMessage, CompletionOptions, Provider};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI chat completion provider
///
/// # Examples
///
/// ```
/// use recovery_coach::config::ProviderConfig;
/// use recovery_coach::providers::OpenAiProvider;
///
/// let config = ProviderConfig::default();
/// let provider = OpenAiProvider::new(&config);
/// assert!(provider.is_ok());
/// ```
pub struct OpenAiProvider {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

/// Response body from `/chat/completions`
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

/// Error envelope returned by the API on failure
#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

impl OpenAiProvider {
    /// Create a new provider from configuration
    ///
    /// A missing API key is not an error here; it is reported by
    /// [`Provider::complete`] so the failure can be classified per request.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("recovery-coach/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoachError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty());

        if api_key.is_none() {
            tracing::warn!("OpenAI API key is missing; completions will fail until it is set");
        }

        tracing::info!(
            "Initialized OpenAI provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Returns true when an API key is available
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

/// Extracts the provider's error message from a failure body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<OpenAiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Option<String>> {
        let api_key = self.api_key.as_deref().ok_or(CoachError::ApiKeyMissing)?;

        let request = OpenAiRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        tracing::debug!(
            "Sending completion request: model={}, {} messages",
            options.model,
            messages.len()
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Completion request failed: {}", e);
                CoachError::Connection(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Completion API returned error {}: {}", status, error_text);
            return Err(CoachError::Api {
                status: status.as_u16(),
                message: api_error_message(&error_text),
            }
            .into());
        }

        let body: OpenAiResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse completion response: {}", e);
            CoachError::ResponseParsing(format!("Failed to parse completion response: {}", e))
        })?;

        if let Some(usage) = &body.usage {
            tracing::debug!(
                "Completion usage: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        let content = body.choices.into_iter().next().and_then(|choice| {
            tracing::debug!("Completion finish_reason={:?}", choice.finish_reason);
            choice.message.content
        });

        Ok(content.filter(|text| !text.trim().is_empty()))
    }

    fn name(&self) -> &str {
        "openai"
    }
}
