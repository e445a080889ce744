//! Connection status types for generation backends.

use serde::{Deserialize, Serialize};

/// Health classification of a generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Probe succeeded within the expected latency
    Connected,

    /// Probe succeeded but with elevated latency
    Degraded,

    /// Probe failed or timed out
    Disconnected,
}

impl ConnectionState {
    /// Get the canonical string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Degraded => "degraded",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Result of probing a generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Provider identifier ("ollama", "openai")
    pub provider: String,

    /// Health state
    pub state: ConnectionState,

    /// Model the backend reports serving, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Diagnostic detail (error text, latency note)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Observed probe round-trip latency in milliseconds, when the probe
    /// completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ConnectionStatus {
    /// Build a disconnected status carrying the failure reason.
    pub fn disconnected(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            state: ConnectionState::Disconnected,
            model: None,
            detail: Some(detail.into()),
            latency_ms: None,
        }
    }
}
