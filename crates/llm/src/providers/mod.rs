//! Generation backend implementations.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;

use crate::status::{ConnectionState, ConnectionStatus};
use std::time::Duration;

/// Classify a successful probe round-trip by its observed latency.
pub(crate) fn classify_probe(
    provider: &str,
    model: &str,
    latency: Duration,
    degraded_latency: Duration,
) -> ConnectionStatus {
    let latency_ms = latency.as_millis() as u64;

    let (state, detail) = if latency >= degraded_latency {
        (
            ConnectionState::Degraded,
            Some(format!("probe latency {}ms above threshold", latency_ms)),
        )
    } else {
        (ConnectionState::Connected, None)
    };

    ConnectionStatus {
        provider: provider.to_string(),
        state,
        model: Some(model.to_string()),
        detail,
        latency_ms: Some(latency_ms),
    }
}
