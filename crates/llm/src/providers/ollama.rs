//! Ollama generation backend.
//!
//! Integration with Ollama, a local LLM runtime.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{GenerationRequest, GenerationResponse, Generator};
use crate::factory::GeneratorConfig;
use crate::providers::classify_probe;
use crate::status::ConnectionStatus;
use knowhow_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    stream: bool,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
}

/// Generator backed by a local Ollama runtime.
pub struct OllamaGenerator {
    /// Base URL for the Ollama API
    base_url: String,

    /// Configured model
    model: String,

    /// HTTP client
    client: reqwest::Client,

    /// Hard timeout per generation call
    timeout: Duration,

    /// Hard timeout per probe round-trip
    probe_timeout: Duration,

    /// Degraded-latency threshold for probes
    degraded_latency: Duration,
}

impl OllamaGenerator {
    /// Create a new Ollama generator.
    pub fn new(base_url: impl Into<String>, config: &GeneratorConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for Ollama: {}", e))
        })?;

        Ok(Self {
            base_url: base_url.into(),
            model: config.model.clone(),
            client,
            timeout: config.timeout,
            probe_timeout: config.probe_timeout,
            degraded_latency: config.degraded_latency,
        })
    }

    /// Convert a GenerationRequest to the Ollama wire format.
    fn to_ollama_request(&self, request: &GenerationRequest) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            temperature: request.temperature,
            num_predict: request.max_tokens,
            stream: false,
        }
    }

    /// Send a request and parse the response, without the timeout bound.
    async fn send(&self, ollama_request: &OllamaRequest) -> AppResult<GenerationResponse> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(ollama_request)
            .send()
            .await
            .map_err(|e| {
                AppError::GenerationUnavailable(format!("Failed to reach Ollama: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::GenerationUnavailable(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            AppError::GenerationUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(GenerationResponse {
            content: ollama_response.response,
            model: ollama_response.model,
        })
    }
}

#[async_trait::async_trait]
impl Generator for OllamaGenerator {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        tracing::debug!(
            model = %self.model,
            prompt_len = request.prompt.len(),
            "Sending generation request to Ollama"
        );

        let ollama_request = self.to_ollama_request(request);

        match tokio::time::timeout(self.timeout, self.send(&ollama_request)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::GenerationUnavailable(format!(
                "Ollama generation timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    async fn probe(&self) -> ConnectionStatus {
        // Single-token round-trip to confirm liveness
        let probe_request = OllamaRequest {
            model: self.model.clone(),
            prompt: "ping".to_string(),
            system: None,
            temperature: None,
            num_predict: Some(1),
            stream: false,
        };

        let start = Instant::now();
        match tokio::time::timeout(self.probe_timeout, self.send(&probe_request)).await {
            Ok(Ok(_)) => classify_probe("ollama", &self.model, start.elapsed(), self.degraded_latency),
            Ok(Err(e)) => ConnectionStatus::disconnected("ollama", e.to_string()),
            Err(_) => ConnectionStatus::disconnected(
                "ollama",
                format!("probe timed out after {}s", self.probe_timeout.as_secs()),
            ),
        }
    }
}
