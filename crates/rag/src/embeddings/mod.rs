//! Embedding generation for chunks and queries.
//!
//! One provider is selected at construction time and used for both
//! ingestion and query embedding; mixing embedding models within one
//! index is forbidden, so the provider's dimensionality is validated
//! against the index wherever the two meet.

pub mod hash;
pub mod ollama;

pub use hash::HashEmbedder;
pub use ollama::OllamaEmbedder;

use knowhow_core::config::EmbeddingSettings;
use knowhow_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name ("hash", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensionality
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    ///
    /// The result has exactly one vector per input text, in order, each
    /// of `dimensions()` length.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate an embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Other("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from configuration.
///
/// Closed set: "hash" (deterministic, offline) and "ollama" (semantic,
/// local API). Unknown providers are a configuration error.
pub fn create_embedder(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "hash" => Ok(Arc::new(HashEmbedder::new(
            &settings.model,
            settings.dimensions,
        ))),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(
            &settings.model,
            settings.dimensions,
        )?)),
        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: hash, ollama",
            other
        ))),
    }
}
