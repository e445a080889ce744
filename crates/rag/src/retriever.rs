//! Query-side retrieval.
//!
//! Embeds a query with the same model the index was populated with and
//! ranks indexed chunks by similarity.

use crate::embeddings::EmbeddingProvider;
use crate::index::EmbeddingIndex;
use crate::types::RetrievalResult;
use knowhow_core::{AppError, AppResult};
use std::sync::Arc;

/// Embeds queries and delegates ranking to the embedding index.
pub struct Retriever {
    index: Arc<EmbeddingIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Create a retriever over an index.
    ///
    /// # Errors
    /// Fails with `EmbeddingDimensionMismatch` when the embedder's
    /// dimensionality differs from the index's. Query and chunk
    /// embeddings must originate from the identical model, so this is a
    /// fatal configuration error, not a runtime-recoverable one.
    pub fn new(
        index: Arc<EmbeddingIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        if embedder.dimensions() != index.dimensions() {
            return Err(AppError::EmbeddingDimensionMismatch {
                expected: index.dimensions(),
                actual: embedder.dimensions(),
            });
        }

        Ok(Self { index, embedder })
    }

    /// Retrieve the top-k chunks most similar to the query text.
    pub async fn retrieve(&self, query_text: &str, k: usize) -> AppResult<Vec<RetrievalResult>> {
        if query_text.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Query text must not be empty".to_string(),
            ));
        }
        if k == 0 {
            return Err(AppError::InvalidArgument(
                "k must be positive".to_string(),
            ));
        }

        let query_embedding = self.embedder.embed(query_text).await?;
        let results = self.index.search(&query_embedding, k)?;

        tracing::debug!(
            k,
            returned = results.len(),
            top_score = results.first().map(|r| r.score),
            "Retrieval completed"
        );

        Ok(results)
    }
}
