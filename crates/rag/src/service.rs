//! The copilot service object.
//!
//! Owns the embedding index, embedder, generator and monitor with an
//! explicit open/close lifecycle. Callers construct one service per
//! process and pass it by reference; there is no ambient global state.

use crate::analyze::DocumentAnalyzer;
use crate::answer::AnswerEngine;
use crate::embeddings::{create_embedder, EmbeddingProvider};
use crate::followup::FollowUpGenerator;
use crate::index::EmbeddingIndex;
use crate::ingest::{self, IngestOptions};
use crate::monitor::ConnectionMonitor;
use crate::retriever::Retriever;
use crate::types::{AnalysisResult, Answer, FollowUpSet, IndexStats, IngestReport};
use knowhow_core::{AppConfig, AppError, AppResult};
use knowhow_llm::{create_generator, ConnectionStatus, Generator, GeneratorConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A query answer with optional follow-up questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The synthesized answer with its evidence
    pub answer: Answer,

    /// Follow-up questions, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_ups: Option<FollowUpSet>,
}

/// The assembled retrieval-and-generation service.
pub struct CopilotService {
    config: AppConfig,
    index: Arc<EmbeddingIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn Generator>,
    answer_engine: AnswerEngine,
    follow_up_generator: FollowUpGenerator,
    analyzer: DocumentAnalyzer,
    monitor: ConnectionMonitor,
}

impl CopilotService {
    /// Open the service: load or create the index and construct the
    /// configured providers.
    pub fn open(config: AppConfig) -> AppResult<Self> {
        let generator_config = GeneratorConfig {
            provider: config.provider.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.generation.timeout_secs),
            probe_timeout: Duration::from_secs(config.probe.timeout_secs),
            degraded_latency: Duration::from_millis(config.probe.degraded_latency_ms),
        };
        let generator = create_generator(&generator_config)?;

        Self::assemble(config, generator)
    }

    /// Assemble the service around an already-constructed generator.
    pub fn assemble(config: AppConfig, generator: Arc<dyn Generator>) -> AppResult<Self> {
        config.ensure_data_dir()?;

        let index = Arc::new(EmbeddingIndex::open(
            &config.index_path(),
            config.embedding.dimensions,
        )?);
        let embedder = create_embedder(&config.embedding)?;

        let retriever = Arc::new(Retriever::new(Arc::clone(&index), Arc::clone(&embedder))?);
        let answer_engine = AnswerEngine::new(
            retriever,
            Arc::clone(&generator),
            config.generation.max_tokens,
            config.generation.temperature,
        );
        let follow_up_generator = FollowUpGenerator::new(Arc::clone(&generator));
        let analyzer = DocumentAnalyzer::new(
            Arc::clone(&generator),
            config.limits.max_analyze_chars,
        );
        let monitor = ConnectionMonitor::new(
            Arc::clone(&generator),
            Duration::from_secs(config.probe.ttl_secs),
        );

        tracing::info!(
            provider = %generator.provider_name(),
            model = %generator.model_name(),
            embedding_provider = %embedder.provider_name(),
            dimensions = embedder.dimensions(),
            "Copilot service opened"
        );

        Ok(Self {
            config,
            index,
            embedder,
            generator,
            answer_engine,
            follow_up_generator,
            analyzer,
            monitor,
        })
    }

    /// Answer a query, optionally with follow-up questions.
    pub async fn query(
        &self,
        query_text: &str,
        k: usize,
        with_follow_ups: bool,
    ) -> AppResult<QueryResponse> {
        let char_count = query_text.chars().count();
        if char_count > self.config.limits.max_query_chars {
            return Err(AppError::InputTooLong {
                actual: char_count,
                max: self.config.limits.max_query_chars,
            });
        }

        let answer = self.answer_engine.answer(query_text, k).await?;

        let follow_ups = if with_follow_ups && !answer.sources.is_empty() {
            Some(
                self.follow_up_generator
                    .follow_ups(query_text, &answer.answer)
                    .await,
            )
        } else {
            None
        };

        Ok(QueryResponse { answer, follow_ups })
    }

    /// Analyze an arbitrary text passage.
    pub async fn analyze(&self, text: &str) -> AppResult<AnalysisResult> {
        self.analyzer.analyze(text).await
    }

    /// Ingest documents from the given paths.
    pub async fn ingest(&self, options: &IngestOptions) -> AppResult<IngestReport> {
        ingest::ingest(&self.index, &self.embedder, options).await
    }

    /// Get the backend connection status.
    pub async fn status(&self, force_refresh: bool) -> ConnectionStatus {
        self.monitor.status(force_refresh).await
    }

    /// Get index statistics.
    pub fn stats(&self) -> AppResult<IndexStats> {
        self.index.stats()
    }

    /// Provider identifier this service generates with.
    pub fn provider(&self) -> &str {
        self.generator.provider_name()
    }

    /// Flush and tear down the service.
    pub fn close(self) -> AppResult<()> {
        self.index.flush()?;
        tracing::debug!("Copilot service closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::StubGenerator;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> AppConfig {
        AppConfig {
            data_dir: dir.path().join("data"),
            ..AppConfig::default()
        }
    }

    fn open_service(dir: &TempDir, generator: Arc<StubGenerator>) -> CopilotService {
        CopilotService::assemble(test_config(dir), generator).unwrap()
    }

    #[tokio::test]
    async fn test_query_over_ingested_corpus() {
        let dir = TempDir::new().unwrap();
        let generator = Arc::new(StubGenerator::responding("Grounded answer [faq.md:0]."));
        let service = open_service(&dir, generator);

        let docs = dir.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(
            docs.join("faq.md"),
            "Cluster autoscaling adds workers when queues grow long.",
        )
        .unwrap();

        let report = service
            .ingest(&IngestOptions {
                paths: vec![docs],
                chunk_size: 800,
                chunk_overlap: 150,
            })
            .await
            .unwrap();
        assert_eq!(report.documents_indexed, 1);

        let response = service
            .query("when does cluster autoscaling add workers", 3, false)
            .await
            .unwrap();

        assert_eq!(response.answer.answer, "Grounded answer [faq.md:0].");
        assert_eq!(response.answer.sources.len(), 1);
        assert!(response.follow_ups.is_none());
    }

    #[tokio::test]
    async fn test_query_length_limit() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir, Arc::new(StubGenerator::responding("unused")));

        let long_query = "q".repeat(501);
        assert!(matches!(
            service.query(&long_query, 3, false).await,
            Err(AppError::InputTooLong { actual: 501, max: 500 })
        ));
    }

    #[tokio::test]
    async fn test_no_context_query_skips_follow_ups() {
        let dir = TempDir::new().unwrap();
        let generator = Arc::new(StubGenerator::responding("unused"));
        let service = open_service(&dir, generator.clone());

        let response = service.query("anything", 3, true).await.unwrap();

        assert!(response.answer.sources.is_empty());
        assert!(response.follow_ups.is_none());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_stats_and_close() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir, Arc::new(StubGenerator::responding("ok")));

        let stats = service.stats().unwrap();
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.chunks, 0);

        service.close().unwrap();
    }
}
