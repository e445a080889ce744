//! OpenAI-compatible generation backend.
//!
//! Remote HTTP provider speaking the chat-completions protocol. Any
//! endpoint implementing the same wire format can be pointed at via the
//! `endpoint` configuration.

use crate::client::{GenerationRequest, GenerationResponse, Generator};
use crate::factory::GeneratorConfig;
use crate::providers::classify_probe;
use crate::status::ConnectionStatus;
use knowhow_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// Chat-completions request format.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat-completions response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Generator backed by a remote chat-completions endpoint.
pub struct OpenAiGenerator {
    /// Endpoint base URL
    base_url: String,

    /// Configured model
    model: String,

    /// Bearer token
    api_key: String,

    /// HTTP client
    client: reqwest::Client,

    /// Hard timeout per generation call
    timeout: Duration,

    /// Hard timeout per probe round-trip
    probe_timeout: Duration,

    /// Degraded-latency threshold for probes
    degraded_latency: Duration,
}

impl OpenAiGenerator {
    /// Create a new remote generator.
    pub fn new(api_key: impl Into<String>, config: &GeneratorConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for OpenAI: {}", e))
        })?;

        let base_url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            client,
            timeout: config.timeout,
            probe_timeout: config.probe_timeout,
            degraded_latency: config.degraded_latency,
        })
    }

    /// Convert a GenerationRequest to the chat-completions wire format.
    fn to_chat_request(&self, request: &GenerationRequest, max_tokens: Option<u32>) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);

        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: max_tokens.or(request.max_tokens),
            temperature: request.temperature,
        }
    }

    /// Send a request and parse the response, without the timeout bound.
    async fn send(&self, chat_request: &ChatRequest) -> AppResult<GenerationResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(chat_request)
            .send()
            .await
            .map_err(|e| {
                AppError::GenerationUnavailable(format!("Failed to reach OpenAI: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::GenerationUnavailable(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            AppError::GenerationUnavailable(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let choice = chat_response.choices.into_iter().next().ok_or_else(|| {
            AppError::GenerationUnavailable("OpenAI returned no choices".to_string())
        })?;

        Ok(GenerationResponse {
            content: choice.message.content,
            model: chat_response.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

#[async_trait::async_trait]
impl Generator for OpenAiGenerator {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        tracing::debug!(
            model = %self.model,
            prompt_len = request.prompt.len(),
            "Sending generation request to OpenAI"
        );

        let chat_request = self.to_chat_request(request, None);

        match tokio::time::timeout(self.timeout, self.send(&chat_request)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::GenerationUnavailable(format!(
                "OpenAI generation timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    async fn probe(&self) -> ConnectionStatus {
        let probe_request = self.to_chat_request(&GenerationRequest::new("ping"), Some(1));

        let start = Instant::now();
        match tokio::time::timeout(self.probe_timeout, self.send(&probe_request)).await {
            Ok(Ok(_)) => classify_probe("openai", &self.model, start.elapsed(), self.degraded_latency),
            Ok(Err(e)) => ConnectionStatus::disconnected("openai", e.to_string()),
            Err(_) => ConnectionStatus::disconnected(
                "openai",
                format!("probe timed out after {}s", self.probe_timeout.as_secs()),
            ),
        }
    }
}
