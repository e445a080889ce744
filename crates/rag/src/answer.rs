//! Grounded answer synthesis.
//!
//! Retrieves relevant chunks and generates a cited natural-language
//! answer. The sources on the returned [`Answer`] are always the actual
//! retrieval set; they are never re-derived from the generated text, so
//! citation integrity does not depend on parsing model output.

use crate::retriever::Retriever;
use crate::types::{Answer, RetrievalResult};
use knowhow_core::AppResult;
use knowhow_llm::{GenerationRequest, Generator};
use std::sync::Arc;
use std::time::Instant;

/// Fixed answer returned when retrieval finds nothing. The generator is
/// not called in that case; an ungrounded answer would be a hallucination.
pub const NO_CONTEXT_ANSWER: &str =
    "No relevant context was found in the knowledge base. \
     Try rephrasing the question, or ingest the relevant documents first.";

/// Synthesizes grounded answers from retrieved evidence.
pub struct AnswerEngine {
    retriever: Arc<Retriever>,
    generator: Arc<dyn Generator>,
    max_tokens: u32,
    temperature: f32,
}

impl AnswerEngine {
    /// Create an answer engine.
    pub fn new(
        retriever: Arc<Retriever>,
        generator: Arc<dyn Generator>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            retriever,
            generator,
            max_tokens,
            temperature,
        }
    }

    /// Answer a query from the top-k retrieved chunks.
    ///
    /// `processing_time_ms` on the result covers the whole operation,
    /// retrieval included.
    pub async fn answer(&self, query_text: &str, k: usize) -> AppResult<Answer> {
        let start = Instant::now();

        // 1. Retrieve evidence
        let results = self.retriever.retrieve(query_text, k).await?;

        // 2. Zero results short-circuits to the fixed no-context answer
        if results.is_empty() {
            tracing::info!("No chunks retrieved; returning no-context answer");
            return Ok(Answer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
                provider: self.generator.provider_name().to_string(),
                processing_time_ms: elapsed_ms(start),
            });
        }

        tracing::info!(
            chunks = results.len(),
            top_score = results[0].score,
            "Synthesizing answer from retrieved context"
        );

        // 3. Assemble the grounded prompt
        let request = GenerationRequest::new(build_user_prompt(query_text, &results))
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        // 4. Generate
        let response = self.generator.generate(&request).await?;

        // 5. Return the answer with the retrieval set as its sources
        Ok(Answer {
            answer: response.content,
            sources: results,
            provider: self.generator.provider_name().to_string(),
            processing_time_ms: elapsed_ms(start),
        })
    }
}

const SYSTEM_PROMPT: &str = "You are a technical-support assistant answering from an internal document collection.\n\
    Instructions:\n\
    - Ground your answer exclusively in the context passages provided; do not use outside knowledge\n\
    - Cite passages by their bracketed label, e.g. [setup.md:2]\n\
    - Never invent a citation label that does not appear in the context\n\
    - If the context does not contain the answer, say so plainly\n\
    - Keep the answer concise and factual";

/// Embed each retrieved chunk labeled with its source and chunk index,
/// followed by the question.
fn build_user_prompt(query: &str, results: &[RetrievalResult]) -> String {
    let context = results
        .iter()
        .map(|r| format!("[{}:{}]\n{}", r.source, r.chunk_index, r.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    format!("Context passages:\n{}\n\nQuestion: {}", context, query)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{EmbeddingProvider, HashEmbedder};
    use crate::index::EmbeddingIndex;
    use crate::tests::support::StubGenerator;
    use crate::types::{Chunk, SourceDocument};
    use chrono::Utc;
    use tempfile::NamedTempFile;

    fn result(source: &str, index: u32, content: &str) -> RetrievalResult {
        RetrievalResult {
            source: source.to_string(),
            chunk_index: index,
            content: content.to_string(),
            score: 0.8,
        }
    }

    async fn engine_with_corpus(
        generator: Arc<StubGenerator>,
        corpus: &[(&str, &str)],
    ) -> (AnswerEngine, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        let index = Arc::new(EmbeddingIndex::open(file.path(), 384).unwrap());
        let embedder = Arc::new(HashEmbedder::new("trigram-v1", 384));

        for (source, text) in corpus {
            let embedding = embedder.embed(text).await.unwrap();
            let document = SourceDocument {
                source_id: source.to_string(),
                path: source.into(),
                content_type: "markdown".to_string(),
                discovered_at: Utc::now(),
                content_hash: "h".to_string(),
                byte_count: text.len() as u64,
                chunk_count: 1,
            };
            let chunk = Chunk {
                source: source.to_string(),
                chunk_index: 0,
                text: text.to_string(),
                embedding: Some(embedding),
            };
            index.upsert(&document, &[chunk]).unwrap();
        }

        let retriever = Arc::new(Retriever::new(index, embedder).unwrap());
        (AnswerEngine::new(retriever, generator, 1000, 0.3), file)
    }

    #[test]
    fn test_prompt_labels_chunks_with_source_and_index() {
        let results = vec![
            result("merge.md", 0, "first passage"),
            result("merge.md", 3, "second passage"),
        ];
        let prompt = build_user_prompt("how does merge work?", &results);

        assert!(prompt.contains("[merge.md:0]\nfirst passage"));
        assert!(prompt.contains("[merge.md:3]\nsecond passage"));
        assert!(prompt.ends_with("Question: how does merge work?"));
    }

    #[tokio::test]
    async fn test_answer_carries_retrieval_set_as_sources() {
        let generator = Arc::new(StubGenerator::responding("Use OPTIMIZE [merge.md:0]."));
        let (engine, _file) = engine_with_corpus(
            generator.clone(),
            &[("merge.md", "MERGE performance improves with OPTIMIZE and pruning")],
        )
        .await;

        let answer = engine.answer("improve merge performance", 3).await.unwrap();

        assert_eq!(answer.answer, "Use OPTIMIZE [merge.md:0].");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].source, "merge.md");
        assert_eq!(answer.sources[0].chunk_index, 0);
        assert_eq!(answer.provider, "stub");
        assert!(answer.processing_time_ms >= 0.0);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_index_skips_generation() {
        let generator = Arc::new(StubGenerator::responding("should never be used"));
        let (engine, _file) = engine_with_corpus(generator.clone(), &[]).await;

        let answer = engine.answer("anything at all", 3).await.unwrap();

        assert_eq!(answer.answer, NO_CONTEXT_ANSWER);
        assert!(answer.sources.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_backend_fault_surfaces_on_answer_path() {
        let generator = Arc::new(StubGenerator::failing());
        let (engine, _file) =
            engine_with_corpus(generator, &[("doc.md", "some indexed content here")]).await;

        let result = engine.answer("some indexed content", 3).await;
        assert!(matches!(
            result,
            Err(knowhow_core::AppError::GenerationUnavailable(_))
        ));
    }
}
