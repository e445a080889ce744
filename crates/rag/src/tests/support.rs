//! Test doubles shared across the crate's test modules.

use knowhow_core::{AppError, AppResult};
use knowhow_llm::{
    ConnectionState, ConnectionStatus, GenerationRequest, GenerationResponse, Generator,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A scriptable in-memory generation backend.
///
/// Counts every `generate` and `probe` call so tests can assert which
/// paths touched the backend.
pub struct StubGenerator {
    script: Mutex<VecDeque<String>>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubGenerator {
    /// A stub that always returns the given text.
    pub fn responding(text: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([text.into()])),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A stub that returns the scripted responses in order, repeating the
    /// last one once the script is exhausted.
    pub fn with_script(responses: Vec<String>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A stub whose every call fails with `GenerationUnavailable`.
    pub fn failing() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Total backend calls observed (generate and probe combined).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> String {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or_default()
        }
    }
}

#[async_trait::async_trait]
impl Generator for StubGenerator {
    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }

    async fn generate(&self, _request: &GenerationRequest) -> AppResult<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(AppError::GenerationUnavailable(
                "stub backend is down".to_string(),
            ));
        }

        Ok(GenerationResponse {
            content: self.next_response(),
            model: "stub-model".to_string(),
        })
    }

    async fn probe(&self) -> ConnectionStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return ConnectionStatus::disconnected("stub", "stub backend is down");
        }

        ConnectionStatus {
            provider: "stub".to_string(),
            state: ConnectionState::Connected,
            model: Some("stub-model".to_string()),
            detail: None,
            latency_ms: Some(1),
        }
    }
}
