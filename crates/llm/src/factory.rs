//! Generator factory.
//!
//! Creates a generation backend from configuration. Provider selection is
//! a closed set resolved once here, at construction time; there is no
//! per-call string dispatch anywhere downstream.

use crate::client::Generator;
use crate::providers::{OllamaGenerator, OpenAiGenerator};
use knowhow_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Known provider variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Local in-process LLM runtime
    Ollama,

    /// Remote HTTP-backed chat-completion endpoint
    OpenAi,
}

impl ProviderKind {
    /// Parse a provider identifier.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
        }
    }
}

/// Configuration for constructing a generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Provider identifier ("ollama", "openai")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom endpoint URL (defaults per provider)
    pub endpoint: Option<String>,

    /// API key for remote providers
    pub api_key: Option<String>,

    /// Hard timeout for a generation call
    pub timeout: Duration,

    /// Hard timeout for a probe round-trip
    pub probe_timeout: Duration,

    /// Probe latency above this classifies the backend as degraded
    pub degraded_latency: Duration,
}

impl GeneratorConfig {
    /// Configuration for the default local runtime.
    pub fn local(model: impl Into<String>) -> Self {
        Self {
            provider: "ollama".to_string(),
            model: model.into(),
            endpoint: None,
            api_key: None,
            timeout: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(10),
            degraded_latency: Duration::from_millis(2000),
        }
    }
}

/// Create a generator for the configured provider.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// secret is missing.
pub fn create_generator(config: &GeneratorConfig) -> AppResult<Arc<dyn Generator>> {
    let kind = ProviderKind::parse(&config.provider).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown provider: '{}'. Supported providers: ollama, openai",
            config.provider
        ))
    })?;

    match kind {
        ProviderKind::Ollama => {
            let base_url = config
                .endpoint
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string());
            let generator = OllamaGenerator::new(base_url, config)?;
            Ok(Arc::new(generator))
        }
        ProviderKind::OpenAi => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                AppError::Config("OpenAI provider requires an API key".to_string())
            })?;
            let generator = OpenAiGenerator::new(api_key, config)?;
            Ok(Arc::new(generator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!(ProviderKind::parse("ollama"), Some(ProviderKind::Ollama));
        assert_eq!(ProviderKind::parse("OpenAI"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::parse("unknown"), None);
    }

    #[test]
    fn test_create_ollama_generator() {
        let generator = create_generator(&GeneratorConfig::local("llama3.2"));
        assert!(generator.is_ok());
        assert_eq!(generator.unwrap().provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let mut config = GeneratorConfig::local("llama3.2");
        config.endpoint = Some("http://localhost:8080".to_string());
        assert!(create_generator(&config).is_ok());
    }

    #[test]
    fn test_openai_requires_api_key() {
        let mut config = GeneratorConfig::local("gpt-4o-mini");
        config.provider = "openai".to_string();

        match create_generator(&config) {
            Err(err) => assert!(err.to_string().contains("requires an API key")),
            Ok(_) => panic!("Expected error for OpenAI without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        let mut config = GeneratorConfig::local("model");
        config.provider = "databricks".to_string();

        match create_generator(&config) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
