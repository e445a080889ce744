//! Generator abstraction and request/response types.
//!
//! This module defines the core abstraction every synthesis step goes
//! through to reach a text-generation backend.

use knowhow_core::AppResult;
use serde::{Deserialize, Serialize};

use crate::status::ConnectionStatus;

/// A single generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The prompt text to send to the backend
    pub prompt: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl GenerationRequest {
    /// Create a new generation request for a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
            system: None,
        }
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// A completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,
}

/// Trait for generation backends.
///
/// Implementations block the calling task until a result or timeout. On
/// timeout or backend fault they fail with
/// `AppError::GenerationUnavailable` rather than returning partial or
/// garbled text.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Get the provider name ("ollama", "openai").
    fn provider_name(&self) -> &str;

    /// Get the configured model identifier.
    fn model_name(&self) -> &str;

    /// Perform a generation call.
    ///
    /// The call is bounded by the provider's configured timeout; expiry
    /// cancels the in-flight request and surfaces
    /// `GenerationUnavailable`.
    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse>;

    /// Probe the backend with a minimal round-trip (a single-token
    /// generation) and classify its health.
    ///
    /// Probing never fails: backend faults are folded into a
    /// `Disconnected` status with the failure reason in `detail`.
    async fn probe(&self) -> ConnectionStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("Hello")
            .with_max_tokens(100)
            .with_temperature(0.3)
            .with_system("You are terse.");

        assert_eq!(request.prompt, "Hello");
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.system.as_deref(), Some("You are terse."));
    }

    #[test]
    fn test_request_optional_fields_skipped_in_json() {
        let json = serde_json::to_string(&GenerationRequest::new("hi")).unwrap();
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("system"));
    }
}
